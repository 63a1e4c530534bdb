use crate::domain::{ContractEventKind, SubscriptionId};
use crate::ports::{LotteryContractPort, PortError};

/// Listener handles held for one contract/account pair.
///
/// The set must be closed against the contract it was opened on; the client
/// does this on every session exit path.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SubscriptionSet {
    handles: Vec<(ContractEventKind, SubscriptionId)>,
}

impl SubscriptionSet {
    pub fn open<C: LotteryContractPort>(contract: &C) -> Result<Self, PortError> {
        let mut set = Self::default();
        for kind in ContractEventKind::ALL {
            match contract.subscribe(kind) {
                Ok(id) => set.handles.push((kind, id)),
                Err(e) => {
                    set.close(contract);
                    return Err(e);
                }
            }
        }
        Ok(set)
    }

    pub fn contains(&self, id: SubscriptionId) -> bool {
        self.handles.iter().any(|(_, h)| *h == id)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn close<C: LotteryContractPort>(&mut self, contract: &C) {
        for (kind, id) in self.handles.drain(..) {
            if let Err(e) = contract.unsubscribe(id) {
                tracing::warn!(event = kind.event_name(), id = id.0, error = %e, "unsubscribe failed");
            }
        }
    }
}
