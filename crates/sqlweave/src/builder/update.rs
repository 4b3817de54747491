use super::{StatementBuilder, StatementCore, StatementKind};
use crate::driver::DriverRef;
use crate::error::{WeaveError, WeaveResult};
use crate::fragment::{self, Fragment};
use crate::params::ParamKey;
use crate::reference::Refs;
use crate::schema::TableHandle;
use crate::value::Value;

/// UPDATE statement builder.
#[derive(Debug, Clone)]
pub struct UpdateQuery {
    core: StatementCore,
    assignments: Vec<String>,
    forced: bool,
}

impl UpdateQuery {
    pub fn new(table: &TableHandle, driver: DriverRef) -> Self {
        Self {
            core: StatementCore::new(table, driver),
            assignments: Vec::new(),
            forced: false,
        }
    }

    /// Add an assignment such as `"age" = $1`.
    pub fn set(mut self, fragment: Fragment) -> Self {
        if !fragment.is_empty() {
            let sql = self.core.merge(fragment);
            self.assignments.push(sql);
        }
        self
    }

    /// Add a literal assignment. Literal text must not contain `$key`
    /// placeholders.
    pub fn set_raw(mut self, sql: impl Into<String>) -> WeaveResult<Self> {
        self.assignments.push(fragment::literal(sql)?);
        Ok(self)
    }

    /// Assign values by property name: `"<column>" = $<property>`.
    ///
    /// All properties are resolved before anything is stored.
    pub fn set_values<I, K, V>(mut self, values: I) -> WeaveResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let root = self.core.root();
        let driver = root.driver().clone();
        let staged = values
            .into_iter()
            .map(|(prop, value)| {
                let column = root.col(prop.as_ref())?;
                let value = driver.to_db(column.column(), value.into());
                Ok((column.property().to_string(), column.unqualified(), value))
            })
            .collect::<WeaveResult<Vec<_>>>()?;

        for (prop, column, value) in staged {
            let key = ParamKey::from(prop);
            self.assignments
                .push(format!("{column} = {}", key.placeholder()));
            self.core.params_mut().bind(key, value);
        }
        Ok(self)
    }

    /// Add an assignment built from the statement's references.
    pub fn set_with<F>(self, f: F) -> WeaveResult<Self>
    where
        F: FnOnce(&Refs) -> WeaveResult<Fragment>,
    {
        let fragment = f(self.core.refs())?;
        Ok(self.set(fragment))
    }

    /// Drop all assignments and the parameters only they used.
    pub fn clear_set(mut self) -> Self {
        self.assignments.clear();
        self.prune_params();
        self
    }

    pub fn has_set(&self) -> bool {
        !self.assignments.is_empty()
    }

    /// Allow running without a WHERE clause.
    pub fn force(mut self) -> Self {
        self.forced = true;
        self
    }
}

impl StatementBuilder for UpdateQuery {
    fn core(&self) -> &StatementCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StatementCore {
        &mut self.core
    }

    fn kind(&self) -> StatementKind {
        StatementKind::Update
    }

    fn is_forced(&self) -> bool {
        self.forced
    }

    fn validate(&self) -> WeaveResult<()> {
        if self.assignments.is_empty() {
            return Err(WeaveError::EmptyAssignment {
                table: self.table().name().to_string(),
            });
        }
        Ok(())
    }

    fn build_sql(&self) -> String {
        format!(
            "UPDATE {} SET {}{}",
            self.core.root().table_expr(),
            self.assignments.join(", "),
            self.core.where_clause()
        )
    }
}
