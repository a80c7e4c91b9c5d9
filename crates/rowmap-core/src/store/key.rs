use derive_more::{Display, From};

///
/// StoreId
/// Identity of one open store instance.
///

#[derive(Clone, Copy, Debug, Display, Eq, From, Hash, Ord, PartialEq, PartialOrd)]
pub struct StoreId(pub u64);

///
/// TableKey
///

#[derive(Clone, Copy, Debug, Display, Eq, From, Hash, Ord, PartialEq, PartialOrd)]
pub struct TableKey(pub usize);

///
/// RowKey
/// Stable row position inside one table.
///

#[derive(Clone, Copy, Debug, Display, Eq, From, Hash, Ord, PartialEq, PartialOrd)]
pub struct RowKey(pub usize);

///
/// RowRef
///
/// Handle to one managed row. Equality is row identity: the same
/// (store, table, row) triple always names the same persisted instance.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[display("{store}:{table}:{row}")]
pub struct RowRef {
    pub store: StoreId,
    pub table: TableKey,
    pub row: RowKey,
}

impl RowRef {
    #[must_use]
    pub const fn new(store: StoreId, table: TableKey, row: RowKey) -> Self {
        Self { store, table, row }
    }

    /// Another row of the same store.
    #[must_use]
    pub const fn sibling(self, table: TableKey, row: RowKey) -> Self {
        Self::new(self.store, table, row)
    }
}
