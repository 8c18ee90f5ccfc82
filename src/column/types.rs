#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Auto-incrementing integer primary key (serial on PostgreSQL).
    PrimaryKey,
    Integer,
    BigInteger,
    SmallInteger,
    String,
    Text,
    Date,
    Time,
    Datetime,
    Boolean,
    Float,
    Decimal,
    Binary,
}

impl ColumnType {
    pub fn keyword(&self) -> &'static str {
        match self {
            ColumnType::PrimaryKey => "primary_key",
            ColumnType::Integer => "integer",
            ColumnType::BigInteger => "big_integer",
            ColumnType::SmallInteger => "small_integer",
            ColumnType::String => "string",
            ColumnType::Text => "text",
            ColumnType::Date => "date",
            ColumnType::Time => "time",
            ColumnType::Datetime => "datetime",
            ColumnType::Boolean => "boolean",
            ColumnType::Float => "float",
            ColumnType::Decimal => "decimal",
            ColumnType::Binary => "binary",
        }
    }

    /// Types that accept a `limit(n)` size modifier.
    pub fn is_sized(&self) -> bool {
        matches!(self, ColumnType::String | ColumnType::Binary)
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            ColumnType::Integer | ColumnType::BigInteger | ColumnType::SmallInteger
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sized_types() {
        assert!(ColumnType::String.is_sized());
        assert!(ColumnType::Binary.is_sized());
        assert!(!ColumnType::Boolean.is_sized());
        assert!(!ColumnType::Integer.is_sized());
    }

    #[test]
    fn integer_family() {
        assert!(ColumnType::Integer.is_integer());
        assert!(ColumnType::BigInteger.is_integer());
        assert!(ColumnType::SmallInteger.is_integer());
        assert!(!ColumnType::PrimaryKey.is_integer());
        assert!(!ColumnType::Float.is_integer());
    }

    #[test]
    fn keyword_round_trip() {
        assert_eq!(ColumnType::String.keyword(), "string");
        assert_eq!(ColumnType::PrimaryKey.keyword(), "primary_key");
    }
}
