use tracing::debug;

use super::{
    check_arrangement,
    context::{SortContext, SortState},
    SortError, Sorting, SortingAlgorithm,
};
use crate::cycle::Cycle;

/// The 3/2-approximation: 2-moves while there are any, (3,2)-sequences otherwise.
#[derive(Debug, Clone, Default)]
pub struct ThreeHalves {
    context: SortContext,
}

impl ThreeHalves {
    pub fn new(context: SortContext) -> Self {
        ThreeHalves { context }
    }

    pub fn context(&self) -> &SortContext {
        &self.context
    }
}

impl SortingAlgorithm for ThreeHalves {
    fn name(&self) -> &'static str {
        "3/2"
    }

    fn sort(&self, pi: &Cycle) -> Result<Sorting, SortError> {
        check_arrangement(pi.symbols())?;
        debug!(algorithm = self.name(), n = pi.len(), "sorting");
        let mut state = SortState::new(pi);
        self.context.finish(&mut state)?;
        Ok(Sorting {
            initial: pi.clone(),
            moves: state.moves,
        })
    }
}
