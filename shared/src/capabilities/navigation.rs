use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

use crate::location::Location;

/// Location changes the core asks the shell to make. The shell reports the
/// resulting fragment back as `Event::LocationChanged`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum NavigationOperation {
    /// Append a history entry for the fragment.
    Push { fragment: String },
    /// Overwrite the current history entry.
    Replace { fragment: String },
    Back,
}

impl Operation for NavigationOperation {
    type Output = ();
}

pub struct Navigation<E> {
    context: CapabilityContext<NavigationOperation, E>,
}

impl<E> Clone for Navigation<E> {
    fn clone(&self) -> Self {
        Self {
            context: self.context.clone(),
        }
    }
}

impl<Ev> Capability<Ev> for Navigation<Ev> {
    type Operation = NavigationOperation;
    type MappedSelf<MappedEv> = Navigation<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Navigation::new(self.context.map_event(f))
    }
}

impl<E> Navigation<E>
where
    E: Send + 'static,
{
    pub fn new(context: CapabilityContext<NavigationOperation, E>) -> Self {
        Self { context }
    }

    pub fn push(&self, location: &Location) {
        self.notify(NavigationOperation::Push {
            fragment: location.to_fragment(),
        });
    }

    pub fn replace(&self, location: &Location) {
        self.notify(NavigationOperation::Replace {
            fragment: location.to_fragment(),
        });
    }

    pub fn back(&self) {
        self.notify(NavigationOperation::Back);
    }

    fn notify(&self, operation: NavigationOperation) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(operation).await;
        });
    }
}
