pub mod trip;

/// A database row that maps onto a domain model value.
pub trait DatabaseRow {
    type Model;

    fn to_model(self) -> Self::Model;
}
