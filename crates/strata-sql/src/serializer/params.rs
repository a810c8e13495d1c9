use super::{Flavor, Formatter, ToSql};

use crate::stmt::Param;

pub trait Params {
    fn push(&mut self, param: &Param) -> Placeholder;
}

pub struct Placeholder(pub usize);

impl Params for Vec<Param> {
    fn push(&mut self, param: &Param) -> Placeholder {
        self.push(param.clone());
        Placeholder(self.len())
    }
}

impl ToSql for Placeholder {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let placeholder = match f.serializer.flavor {
            Flavor::Mysql => "?".to_string(),
            Flavor::Postgresql => format!("${}", self.0),
            Flavor::Sqlite => format!("?{}", self.0),
        };
        f.dst.push_str(&placeholder);
    }
}
