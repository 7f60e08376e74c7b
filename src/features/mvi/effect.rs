use std::future::Future;

/// Follow-up work returned by a reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect<T> {
    None,
    Run(T),
}

impl<T> Effect<T> {
    pub fn is_none(&self) -> bool {
        matches!(self, Effect::None)
    }
}

/// Executes reducer tasks against live dependencies.
pub trait Environment<T>: Send + Sync + 'static {
    fn execute(&self, task: T) -> impl Future<Output = ()> + Send;
}
