use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use super::effect::{Effect, Environment};
use super::reducer::Reducer;

/// Owns a feature's state and runs the effects its reducer returns.
pub struct FeatureStore<R: Reducer, E> {
    state: Mutex<R::State>,
    environment: Arc<E>,
}

impl<R, E> FeatureStore<R, E>
where
    R: Reducer,
    E: Environment<R::Task>,
{
    pub fn new(initial: R::State, environment: E) -> Self {
        Self {
            state: Mutex::new(initial),
            environment: Arc::new(environment),
        }
    }

    /// Reduce `intent`; a returned task is spawned and its handle returned.
    pub fn send(&self, intent: R::Intent) -> Option<JoinHandle<()>> {
        let effect = {
            let mut state = self.state.lock();
            R::reduce(&mut state, intent)
        };

        match effect {
            Effect::None => None,
            Effect::Run(task) => {
                let environment = Arc::clone(&self.environment);
                Some(tokio::spawn(async move {
                    environment.execute(task).await;
                }))
            }
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> R::State {
        self.state.lock().clone()
    }

    /// Read the state without cloning it.
    pub fn with_state<T>(&self, f: impl FnOnce(&R::State) -> T) -> T {
        f(&self.state.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::mvi::{FeatureState, Intent};
    use std::future::Future;
    use tokio::sync::mpsc;

    #[derive(Debug, Clone, PartialEq, Default)]
    struct CounterState {
        count: i64,
    }

    impl FeatureState for CounterState {}

    enum CounterIntent {
        Increment,
        Report,
    }

    impl Intent for CounterIntent {}

    struct CounterReducer;

    impl Reducer for CounterReducer {
        type State = CounterState;
        type Intent = CounterIntent;
        type Task = i64;

        fn reduce(state: &mut CounterState, intent: CounterIntent) -> Effect<i64> {
            match intent {
                CounterIntent::Increment => {
                    state.count += 1;
                    Effect::None
                }
                CounterIntent::Report => Effect::Run(state.count),
            }
        }
    }

    struct Reporter(mpsc::UnboundedSender<i64>);

    impl Environment<i64> for Reporter {
        fn execute(&self, task: i64) -> impl Future<Output = ()> + Send {
            let tx = self.0.clone();
            async move {
                let _ = tx.send(task);
            }
        }
    }

    #[tokio::test]
    async fn test_effects_run_on_environment() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let store: FeatureStore<CounterReducer, Reporter> =
            FeatureStore::new(CounterState::default(), Reporter(tx));

        assert!(store.send(CounterIntent::Increment).is_none());
        assert!(store.send(CounterIntent::Increment).is_none());
        store.send(CounterIntent::Report).unwrap().await.unwrap();

        assert_eq!(rx.recv().await, Some(2));
        assert_eq!(store.state(), CounterState { count: 2 });
        assert_eq!(store.with_state(|state| state.count), 2);
    }
}
