/// What a load request is for; each kind has its own generation counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    Model,
    Environment,
}

/// Token handed out when a load starts and checked when it completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub kind: LoadKind,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Installed,
    /// A newer request of the same kind was issued; the result was dropped.
    Stale,
    Failed(String),
}

/// Monotonic generation counters; only the newest ticket of a kind may install.
#[derive(Debug, Default)]
pub struct LoadTracker {
    model: u64,
    environment: u64,
}

impl LoadTracker {
    pub fn begin(&mut self, kind: LoadKind) -> LoadTicket {
        let counter = self.counter_mut(kind);
        *counter += 1;
        LoadTicket {
            kind,
            generation: *counter,
        }
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        let current = match ticket.kind {
            LoadKind::Model => self.model,
            LoadKind::Environment => self.environment,
        };
        ticket.generation == current
    }

    fn counter_mut(&mut self, kind: LoadKind) -> &mut u64 {
        match kind {
            LoadKind::Model => &mut self.model,
            LoadKind::Environment => &mut self.environment,
        }
    }
}
