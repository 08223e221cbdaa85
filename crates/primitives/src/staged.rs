//! Sequential transformation pipeline for building user operations

/// A value moving through a sequence of transformation stages.
///
/// Each stage receives its own copy of the staged value and produces a new one, so no stage can
/// observe or mutate a value another stage holds, and the value handed in by the caller is never
/// aliased. Staging performs no I/O; stages that talk to a node run before or after the
/// pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Staged<T>(T);

impl<T: Clone> Staged<T> {
    /// Stages a value
    pub fn of(value: T) -> Self {
        Self(value)
    }

    /// Applies the next stage to a copy of the staged value
    pub fn bind<U, F>(&self, stage: F) -> Staged<U>
    where
        F: FnOnce(T) -> Staged<U>,
    {
        stage(self.0.clone())
    }

    /// Applies a fallible stage, short-circuiting on the first error
    pub fn try_bind<U, E, F>(&self, stage: F) -> Result<Staged<U>, E>
    where
        F: FnOnce(T) -> Result<Staged<U>, E>,
    {
        stage(self.0.clone())
    }

    /// Applies a plain function as a stage
    pub fn map<U, F>(&self, f: F) -> Staged<U>
    where
        F: FnOnce(T) -> U,
    {
        Staged(f(self.0.clone()))
    }

    /// Independent copy of the staged value
    pub fn snapshot(&self) -> T {
        self.0.clone()
    }

    /// Ends the pipeline, yielding the staged value
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: Clone> From<T> for Staged<T> {
    fn from(value: T) -> Self {
        Self::of(value)
    }
}
