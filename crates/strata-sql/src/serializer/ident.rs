use super::{Formatter, Params, ToSql};

/// A table, column or alias name. Names are emitted as mapped; a mapping
/// that needs quoting spells the quotes out in the name.
pub(super) struct Ident<S>(pub(super) S);

impl<S: AsRef<str>> ToSql for Ident<S> {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        f.dst.push_str(self.0.as_ref());
    }
}
