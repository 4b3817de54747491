use super::{StatementBuilder, StatementCore, StatementKind};
use crate::driver::DriverRef;
use crate::schema::TableHandle;

/// DELETE statement builder.
#[derive(Debug, Clone)]
pub struct DeleteQuery {
    core: StatementCore,
    forced: bool,
}

impl DeleteQuery {
    pub fn new(table: &TableHandle, driver: DriverRef) -> Self {
        Self {
            core: StatementCore::new(table, driver),
            forced: false,
        }
    }

    /// Allow running without a WHERE clause.
    pub fn force(mut self) -> Self {
        self.forced = true;
        self
    }
}

impl StatementBuilder for DeleteQuery {
    fn core(&self) -> &StatementCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StatementCore {
        &mut self.core
    }

    fn kind(&self) -> StatementKind {
        StatementKind::Delete
    }

    fn is_forced(&self) -> bool {
        self.forced
    }

    fn build_sql(&self) -> String {
        format!(
            "DELETE FROM {}{}",
            self.core.root().table_expr(),
            self.core.where_clause()
        )
    }
}
