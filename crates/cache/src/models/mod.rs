mod author;
mod work;

pub(crate) use self::author::AuthorRow;
pub(crate) use self::work::WorkRow;
