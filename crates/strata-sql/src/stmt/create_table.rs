use super::Statement;

use strata_core::mapping::{ClassMetadata, FieldType, InheritanceType};
use strata_core::{Result, Schema};

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub primary_key: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub ty: FieldType,
    pub not_null: bool,

    /// The database assigns the value on insert.
    pub auto_increment: bool,
}

impl Statement {
    /// `CREATE TABLE` statements for every entity hierarchy and every
    /// many-to-many bridge table of `schema`.
    pub fn create_tables(schema: &Schema) -> Result<Vec<Statement>> {
        let mut ret = vec![];

        for class in schema.classes() {
            if class.is_mapped_superclass || !class.is_inheritance_root() {
                continue;
            }

            ret.push(Statement::create_table(schema, class)?);

            for assoc in class.associations.values() {
                if let Some(join_table) = assoc.join_table() {
                    if !assoc.is_owning_side() {
                        continue;
                    }

                    let source = schema.class(assoc.source_entity())?;
                    let target = schema.target_of(assoc)?;

                    let mut columns = vec![];
                    for jc in &join_table.join_columns {
                        let ty = referenced_type(source, &jc.referenced_column_name);
                        columns.push(ColumnDef::not_null(&jc.name, ty));
                    }
                    for jc in &join_table.inverse_join_columns {
                        let ty = referenced_type(target, &jc.referenced_column_name);
                        columns.push(ColumnDef::not_null(&jc.name, ty));
                    }

                    ret.push(
                        CreateTable {
                            name: join_table.qualified_name(),
                            primary_key: columns
                                .iter()
                                .map(|column| column.name.clone())
                                .collect(),
                            columns,
                        }
                        .into(),
                    );
                }
            }
        }

        Ok(ret)
    }

    /// `CREATE TABLE` for the table of `class`. Single-table hierarchies
    /// add the columns of every subclass and the discriminator.
    pub fn create_table(schema: &Schema, class: &ClassMetadata) -> Result<Statement> {
        let mut columns: Vec<ColumnDef> = vec![];

        let mut hierarchy = vec![class];
        if class.inheritance == InheritanceType::SingleTable {
            for subclass in &class.subclasses {
                hierarchy.push(&**schema.class(subclass)?);
            }
        }

        let auto_increment = class.is_id_generator_identity() && !class.is_identifier_composite();

        for (index, member) in hierarchy.iter().enumerate() {
            let is_subclass = index > 0;

            for field in member.fields.values() {
                if columns.iter().any(|column| column.name == field.column_name) {
                    continue;
                }

                columns.push(ColumnDef {
                    name: field.column_name.clone(),
                    ty: field.ty,
                    not_null: !(field.nullable || is_subclass),
                    auto_increment: auto_increment && field.id,
                });
            }

            for assoc in member.associations.values() {
                if !(assoc.is_to_one() && assoc.is_owning_side()) {
                    continue;
                }

                let target = schema.target_of(assoc)?;

                for jc in assoc.join_columns() {
                    if columns.iter().any(|column| column.name == jc.name) {
                        continue;
                    }

                    columns.push(ColumnDef {
                        name: jc.name.clone(),
                        ty: referenced_type(target, &jc.referenced_column_name),
                        not_null: !(jc.is_nullable() || is_subclass),
                        auto_increment: false,
                    });
                }
            }
        }

        if let Some(discriminator) = &class.discriminator_column {
            columns.push(ColumnDef::not_null(&discriminator.name, discriminator.ty));
        }

        Ok(CreateTable {
            name: class.table.qualified_name(),
            columns,
            primary_key: class
                .identifier_columns()
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
        .into())
    }
}

impl ColumnDef {
    fn not_null(name: &str, ty: FieldType) -> ColumnDef {
        ColumnDef {
            name: name.to_string(),
            ty,
            not_null: true,
            auto_increment: false,
        }
    }
}

/// Type of the column `column` of `class`. Key columns that are themselves
/// foreign keys default to integers.
fn referenced_type(class: &ClassMetadata, column: &str) -> FieldType {
    class
        .field_for_column(column)
        .map(|field| field.ty)
        .unwrap_or(FieldType::Integer)
}

impl From<CreateTable> for Statement {
    fn from(value: CreateTable) -> Self {
        Statement::CreateTable(value)
    }
}
