mod types;

pub use types::ColumnType;

use sea_query::{Alias, ColumnDef, Expr};

use crate::error::MigrateError;

/// One column modifier, recorded in the order the author wrote it.
#[derive(Debug, Clone, PartialEq)]
pub enum Modifier {
    Limit(u32),
    Default(String),
    NotNull,
    Unique,
    Unsigned,
}

impl Modifier {
    pub fn keyword(&self) -> &'static str {
        match self {
            Modifier::Limit(_) => "limit",
            Modifier::Default(_) => "default",
            Modifier::NotNull => "not_null",
            Modifier::Unique => "unique",
            Modifier::Unsigned => "unsigned",
        }
    }
}

/// An abstract column specification: base type plus ordered modifiers.
///
/// Conflicting modifiers are rejected by [`Column::compile`], never silently
/// overwritten, so a spec that says `default` twice is an authoring error.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub base: ColumnType,
    pub modifiers: Vec<Modifier>,
}

impl Column {
    pub fn new(name: impl Into<String>, base: ColumnType) -> Self {
        Self {
            name: name.into(),
            base,
            modifiers: Vec::new(),
        }
    }

    pub fn limit(mut self, size: u32) -> Self {
        self.modifiers.push(Modifier::Limit(size));
        self
    }

    /// Default value, written as a SQL expression (`"'active'"`,
    /// `"CURRENT_TIMESTAMP"`, `"0"`).
    pub fn default(mut self, value: impl Into<String>) -> Self {
        self.modifiers.push(Modifier::Default(value.into()));
        self
    }

    pub fn not_null(mut self) -> Self {
        self.modifiers.push(Modifier::NotNull);
        self
    }

    pub fn unique(mut self) -> Self {
        self.modifiers.push(Modifier::Unique);
        self
    }

    pub fn unsigned(mut self) -> Self {
        self.modifiers.push(Modifier::Unsigned);
        self
    }

    fn find_limit(&self) -> Option<u32> {
        self.modifiers.iter().find_map(|m| match m {
            Modifier::Limit(n) => Some(*n),
            _ => None,
        })
    }

    fn has(&self, keyword: &str) -> bool {
        self.modifiers.iter().any(|m| m.keyword() == keyword)
    }

    fn validate(&self) -> Result<(), MigrateError> {
        let mut seen: Vec<&'static str> = Vec::new();
        for modifier in &self.modifiers {
            let keyword = modifier.keyword();
            if seen.contains(&keyword) {
                return Err(MigrateError::Validation(format!(
                    "duplicate `{}` modifier on column `{}`",
                    keyword, self.name
                )));
            }
            seen.push(keyword);
        }

        if self.has("limit") && !self.base.is_sized() {
            return Err(MigrateError::Validation(format!(
                "`limit` is not valid for {} column `{}`",
                self.base.keyword(),
                self.name
            )));
        }

        if self.has("unsigned") && !self.base.is_integer() {
            return Err(MigrateError::Validation(format!(
                "`unsigned` is not valid for {} column `{}`",
                self.base.keyword(),
                self.name
            )));
        }

        if self.base == ColumnType::PrimaryKey
            && self.modifiers.iter().any(|m| {
                matches!(
                    m,
                    Modifier::Limit(_) | Modifier::Default(_) | Modifier::Unsigned
                )
            })
        {
            return Err(MigrateError::Validation(format!(
                "primary_key column `{}` accepts no value modifiers",
                self.name
            )));
        }

        Ok(())
    }

    /// Compile this specification into a dialect-neutral column definition.
    ///
    /// Pure: validates the modifier set, then applies the base type and
    /// modifiers in a fixed order (type, key, NOT NULL, UNIQUE, DEFAULT) so
    /// the rendered DDL is deterministic.
    pub fn compile(&self) -> Result<ColumnDef, MigrateError> {
        self.validate()?;

        let mut def = ColumnDef::new(Alias::new(&self.name));
        let limit = self.find_limit();
        let unsigned = self.has("unsigned");

        match self.base {
            ColumnType::PrimaryKey => {
                def.integer();
                def.primary_key();
                def.auto_increment();
            }
            ColumnType::Integer => {
                if unsigned {
                    def.unsigned();
                } else {
                    def.integer();
                }
            }
            ColumnType::BigInteger => {
                if unsigned {
                    def.big_unsigned();
                } else {
                    def.big_integer();
                }
            }
            ColumnType::SmallInteger => {
                if unsigned {
                    def.small_unsigned();
                } else {
                    def.small_integer();
                }
            }
            ColumnType::String => {
                match limit {
                    Some(n) => def.string_len(n),
                    None => def.string(),
                };
            }
            ColumnType::Text => {
                def.text();
            }
            ColumnType::Date => {
                def.date();
            }
            ColumnType::Time => {
                def.time();
            }
            ColumnType::Datetime => {
                def.timestamp();
            }
            ColumnType::Boolean => {
                def.boolean();
            }
            ColumnType::Float => {
                def.double();
            }
            ColumnType::Decimal => {
                def.decimal();
            }
            ColumnType::Binary => {
                match limit {
                    Some(n) => def.binary_len(n),
                    None => def.binary(),
                };
            }
        }

        if self.has("not_null") && self.base != ColumnType::PrimaryKey {
            def.not_null();
        }

        if self.has("unique") && self.base != ColumnType::PrimaryKey {
            def.unique_key();
        }

        for modifier in &self.modifiers {
            if let Modifier::Default(value) = modifier {
                def.default(Expr::cust(value.as_str()));
            }
        }

        Ok(def)
    }
}
