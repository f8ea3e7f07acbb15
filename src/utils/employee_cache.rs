use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use crate::domain::error::LeaveError;
use crate::model::employee::Employee;
use crate::store::LeaveStore;

/// Read-through cache for employee snapshots. The workflow resolves the
/// same employee on nearly every operation; snapshots are small and
/// rarely change, so a short TTL keeps them honest.
pub struct EmployeeDirectory {
    store: Arc<dyn LeaveStore>,
    cache: Cache<u64, Employee>,
}

impl EmployeeDirectory {
    pub fn new(store: Arc<dyn LeaveStore>) -> Self {
        Self {
            store,
            cache: Cache::builder()
                .max_capacity(100_000)
                .time_to_live(Duration::from_secs(300)) // 5 min TTL
                .build(),
        }
    }

    pub async fn get(&self, employee_id: u64) -> Result<Employee, LeaveError> {
        if let Some(employee) = self.cache.get(&employee_id).await {
            return Ok(employee);
        }

        let employee = self
            .store
            .employee_by_id(employee_id)
            .await?
            .ok_or_else(|| LeaveError::NotFound(format!("Employee with id: {}", employee_id)))?;

        self.cache.insert(employee_id, employee.clone()).await;
        Ok(employee)
    }
}
