use log::trace;

/// One link in a chain-of-responsibility.
///
/// A stage consumes an item and forwards zero or more items (possibly
/// transformed) by pushing them onto `forward`. Not forwarding is how a
/// stage drops an item; dropping is a normal outcome, not an error.
pub trait PipelineStage<C, T>: Send {
    fn name(&self) -> &'static str;

    fn process(&mut self, context: &mut C, item: T, forward: &mut Vec<T>);
}

/// An explicitly ordered list of stages sharing a context type `C`.
///
/// Items leave the pipeline in the order they entered it: every stage sees
/// its input batch in order and appends its output in order.
pub struct Pipeline<C, T> {
    stages: Vec<Box<dyn PipelineStage<C, T>>>,
}

impl<C, T> Pipeline<C, T> {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    pub fn push_stage<S: PipelineStage<C, T> + 'static>(&mut self, stage: S) -> &mut Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    pub fn process(&mut self, context: &mut C, item: T) -> Vec<T> {
        self.process_all(context, vec![item])
    }

    pub fn process_all(&mut self, context: &mut C, items: Vec<T>) -> Vec<T> {
        let mut batch = items;
        for stage in self.stages.iter_mut() {
            if batch.is_empty() {
                break;
            }
            let received = batch.len();
            let mut forwarded = Vec::with_capacity(received);
            for item in batch {
                stage.process(context, item, &mut forwarded);
            }
            if forwarded.len() != received {
                trace!(
                    "Stage {} forwarded {} of {} items",
                    stage.name(),
                    forwarded.len(),
                    received
                );
            }
            batch = forwarded;
        }
        batch
    }
}

impl<C, T> Default for Pipeline<C, T> {
    fn default() -> Self {
        Self::new()
    }
}
