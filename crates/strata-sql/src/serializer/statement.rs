use super::{Comma, Flavor, Ident, Params, ToSql};

use crate::stmt;

impl ToSql for &stmt::Statement {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        match self {
            stmt::Statement::CreateTable(stmt) => stmt.to_sql(f),
            stmt::Statement::Delete(stmt) => stmt.to_sql(f),
            stmt::Statement::Insert(stmt) => stmt.to_sql(f),
            stmt::Statement::Select(stmt) => stmt.to_sql(f),
            stmt::Statement::Update(stmt) => stmt.to_sql(f),
        }
    }
}

impl ToSql for &stmt::CreateTable {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        // SQLite only auto-increments an `INTEGER PRIMARY KEY` declared inline
        let inline_pk = f.serializer.is_sqlite() && self.columns.iter().any(|c| c.auto_increment);

        fmt!(f, "CREATE TABLE ", Ident(&self.name), " (", Comma(&self.columns));

        if !inline_pk && !self.primary_key.is_empty() {
            fmt!(f, ", PRIMARY KEY (", Comma(self.primary_key.iter().map(Ident)), ")");
        }

        fmt!(f, ")");
    }
}

impl ToSql for &stmt::ColumnDef {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        fmt!(f, Ident(&self.name), " ");

        if !self.auto_increment {
            fmt!(f, self.ty);
            if self.not_null {
                fmt!(f, " NOT NULL");
            }
            return;
        }

        match f.serializer.flavor {
            Flavor::Sqlite => fmt!(f, "INTEGER PRIMARY KEY AUTOINCREMENT"),
            Flavor::Postgresql => fmt!(f, self.ty, " GENERATED BY DEFAULT AS IDENTITY"),
            Flavor::Mysql => fmt!(f, self.ty, " NOT NULL AUTO_INCREMENT"),
        }
    }
}

impl ToSql for &stmt::Delete {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        fmt!(f, "DELETE FROM ", Ident(&self.table));

        if let Some(filter) = &self.filter {
            fmt!(f, " WHERE ", filter);
        }
    }
}

impl ToSql for &stmt::Insert {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        fmt!(f, "INSERT INTO ", Ident(&self.table));

        if self.columns.is_empty() && f.serializer.is_mysql() {
            fmt!(f, " () VALUES ()");
        } else if self.columns.is_empty() {
            fmt!(f, " DEFAULT VALUES");
        } else {
            let columns = Comma(self.columns.iter().map(Ident));
            fmt!(f, " (", columns, ") VALUES (", Comma(&self.values), ")");
        }

        if !self.returning.is_empty() {
            fmt!(f, " RETURNING ", Comma(self.returning.iter().map(Ident)));
        }
    }
}

impl ToSql for &stmt::Update {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        let assignments = Comma(self.assignments.iter().map(Assignment));
        fmt!(f, "UPDATE ", Ident(&self.table), " SET ", assignments);

        if let Some(filter) = &self.filter {
            fmt!(f, " WHERE ", filter);
        }
    }
}

struct Assignment<'a>(&'a (String, stmt::Expr));

impl ToSql for Assignment<'_> {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        let (column, value) = self.0;
        fmt!(f, Ident(column), " = ", value);
    }
}

impl ToSql for &stmt::Select {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        fmt!(f, "SELECT ");
        if self.distinct {
            fmt!(f, "DISTINCT ");
        }
        fmt!(f, Comma(&self.columns), " FROM ", Comma(&self.from));

        if let Some(filter) = &self.filter {
            fmt!(f, " WHERE ", filter);
        }

        if !self.group_by.is_empty() {
            fmt!(f, " GROUP BY ", Comma(&self.group_by));
        }

        if let Some(having) = &self.having {
            fmt!(f, " HAVING ", having);
        }

        if !self.order_by.is_empty() {
            fmt!(f, " ORDER BY ", Comma(&self.order_by));
        }

        match (self.limit, self.offset) {
            (Some(limit), Some(offset)) => fmt!(f, " LIMIT ", limit, " OFFSET ", offset),
            (Some(limit), None) => fmt!(f, " LIMIT ", limit),
            (None, Some(offset)) => match f.serializer.flavor {
                Flavor::Sqlite => fmt!(f, " LIMIT -1 OFFSET ", offset),
                Flavor::Mysql => fmt!(f, " LIMIT 18446744073709551615 OFFSET ", offset),
                Flavor::Postgresql => fmt!(f, " OFFSET ", offset),
            },
            (None, None) => {}
        }
    }
}

impl ToSql for &stmt::SelectItem {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        fmt!(f, &self.expr);
        if let Some(alias) = &self.alias {
            fmt!(f, " AS ", Ident(alias));
        }
    }
}

impl ToSql for &stmt::TableWithJoins {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        fmt!(f, &self.table);

        for join in &self.joins {
            let kind = match join.kind {
                stmt::JoinKind::Inner => " INNER JOIN ",
                stmt::JoinKind::Left => " LEFT JOIN ",
            };
            fmt!(f, kind, &join.table, " ON ", &join.on);
        }
    }
}

impl ToSql for &stmt::TableRef {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        fmt!(f, Ident(&self.name));
        if let Some(alias) = &self.alias {
            fmt!(f, " ", Ident(alias));
        }
    }
}

impl ToSql for &stmt::OrderBy {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        let direction = if self.descending { " DESC" } else { " ASC" };
        fmt!(f, &self.expr, direction);
    }
}

#[cfg(test)]
mod tests {
    use crate::serializer::Serializer;
    use crate::stmt::*;

    use strata_core::mapping::FieldType;

    fn select() -> Statement {
        Select {
            columns: vec![SelectItem {
                expr: Expr::column(Some("f0_"), "file_id"),
                alias: Some("file_id_0".into()),
            }],
            from: vec![TableWithJoins {
                table: TableRef::new("File", Some("f0_".into())),
                joins: vec![],
            }],
            filter: Some(Expr::eq(
                Expr::column(Some("f0_"), "file_id"),
                Expr::value(5),
            )),
            limit: Some(10),
            offset: Some(20),
            ..Select::default()
        }
        .into()
    }

    #[test]
    fn placeholders_per_flavor() {
        let stmt = select();

        let mut params: Vec<Param> = vec![];
        assert_eq!(
            Serializer::sqlite().serialize(&stmt, &mut params),
            "SELECT f0_.file_id AS file_id_0 FROM File f0_ WHERE f0_.file_id = ?1 LIMIT 10 OFFSET 20"
        );
        assert_eq!(params, [Param::Value(5.into())]);

        let mut params: Vec<Param> = vec![];
        assert!(Serializer::postgresql()
            .serialize(&stmt, &mut params)
            .contains("= $1"));

        let mut params: Vec<Param> = vec![];
        assert!(Serializer::mysql()
            .serialize(&stmt, &mut params)
            .contains("= ? LIMIT"));
    }

    #[test]
    fn offset_without_limit() {
        let stmt: Statement = Select {
            columns: vec![SelectItem {
                expr: Expr::column(None, "id"),
                alias: None,
            }],
            from: vec![TableWithJoins {
                table: TableRef::new("Item", None),
                joins: vec![],
            }],
            offset: Some(3),
            ..Select::default()
        }
        .into();

        let mut params: Vec<Param> = vec![];
        assert_eq!(
            Serializer::sqlite().serialize(&stmt, &mut params),
            "SELECT id FROM Item LIMIT -1 OFFSET 3"
        );
    }

    #[test]
    fn create_table_with_identity() {
        let stmt: Statement = CreateTable {
            name: "Picture".into(),
            columns: vec![
                ColumnDef {
                    name: "picture_id".into(),
                    ty: FieldType::Integer,
                    not_null: true,
                    auto_increment: true,
                },
                ColumnDef {
                    name: "file_id".into(),
                    ty: FieldType::Integer,
                    not_null: false,
                    auto_increment: false,
                },
            ],
            primary_key: vec!["picture_id".into()],
        }
        .into();

        let mut params: Vec<Param> = vec![];
        assert_eq!(
            Serializer::sqlite().serialize(&stmt, &mut params),
            "CREATE TABLE Picture (picture_id INTEGER PRIMARY KEY AUTOINCREMENT, file_id INTEGER)"
        );
        assert_eq!(
            Serializer::postgresql().serialize(&stmt, &mut params),
            "CREATE TABLE Picture (picture_id INTEGER GENERATED BY DEFAULT AS IDENTITY, \
             file_id INTEGER, PRIMARY KEY (picture_id))"
        );
    }

    #[test]
    fn insert_default_values() {
        let stmt: Statement = Insert {
            table: "File".into(),
            columns: vec![],
            values: vec![],
            returning: vec![],
        }
        .into();

        let mut params: Vec<Param> = vec![];
        assert_eq!(
            Serializer::sqlite().serialize(&stmt, &mut params),
            "INSERT INTO File DEFAULT VALUES"
        );
    }

    #[test]
    fn update_and_delete() {
        let update: Statement = Update {
            table: "Picture".into(),
            assignments: vec![("file_id".into(), Expr::Null)],
            filter: Some(Expr::eq(Expr::column(None, "picture_id"), Expr::value(1))),
        }
        .into();
        let delete: Statement = Delete {
            table: "Picture".into(),
            filter: Some(Expr::eq(Expr::column(None, "picture_id"), Expr::value(1))),
        }
        .into();

        let mut params: Vec<Param> = vec![];
        assert_eq!(
            Serializer::sqlite().serialize(&update, &mut params),
            "UPDATE Picture SET file_id = NULL WHERE picture_id = ?1"
        );
        assert_eq!(
            Serializer::sqlite().serialize(&delete, &mut params),
            "DELETE FROM Picture WHERE picture_id = ?2"
        );
    }
}
