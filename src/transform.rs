//! The named transform pipeline.
//!
//! Transforms are plain functions over a document, composed sequentially.
//! The context carries the pipeline's name stack so a transform can elide
//! work it knows a downstream stage will redo.

use crate::document::Document;
use crate::error::Result;

/// A named mutation of a document.
pub struct Transform {
    name: String,
    func: Box<dyn Fn(&mut Document, &TransformContext) -> Result<()>>,
}

impl Transform {
    /// Wraps a function with its stable transform name.
    pub fn new(
        name: impl Into<String>,
        func: impl Fn(&mut Document, &TransformContext) -> Result<()> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            func: Box::new(func),
        }
    }

    /// The transform's stable name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Pipeline state threaded through every transform.
#[derive(Clone, Debug, Default)]
pub struct TransformContext {
    stack: Vec<String>,
    cursor: usize,
}

impl TransformContext {
    /// The names of every transform in the pipeline, outer stages first.
    pub fn stack(&self) -> &[String] {
        &self.stack
    }

    /// The currently running transform.
    pub fn current(&self) -> Option<&str> {
        self.stack.get(self.cursor).map(String::as_str)
    }

    /// Whether a transform named `name` is scheduled after the current one.
    ///
    /// Lets a stage skip cleanup (for example a final prune) that a later
    /// stage will perform anyway.
    pub fn is_pending(&self, name: &str) -> bool {
        self.stack[self.cursor + 1..].iter().any(|n| n == name)
    }

    /// The prefix of the stack up to and including the current transform,
    /// for scoping a nested pipeline.
    pub fn scope(&self) -> &[String] {
        if self.stack.is_empty() {
            return &self.stack;
        }
        &self.stack[..=self.cursor.min(self.stack.len() - 1)]
    }
}

impl Document {
    /// Applies a pipeline of transforms in order.
    ///
    /// An error aborts the pipeline; mutations already performed are kept,
    /// with no rollback.
    pub fn transform(&mut self, pipeline: Vec<Transform>) -> Result<()> {
        self.transform_scoped(&[], pipeline)
    }

    /// Applies a pipeline nested under an outer pipeline's scope.
    ///
    /// Called by transforms that recurse, passing
    /// [`TransformContext::scope`] so the combined stack stays visible to
    /// [`TransformContext::is_pending`].
    pub fn transform_scoped(&mut self, outer: &[String], pipeline: Vec<Transform>) -> Result<()> {
        let mut stack: Vec<String> = outer.to_vec();
        let base = stack.len();
        stack.extend(pipeline.iter().map(|t| t.name.clone()));
        for (index, transform) in pipeline.iter().enumerate() {
            let context = TransformContext {
                stack: stack.clone(),
                cursor: base + index,
            };
            self.logger().debug(&format!("{}: begin", transform.name));
            (transform.func)(self, &context)?;
            self.logger().debug(&format!("{}: done", transform.name));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_sees_later_stages_only() {
        let ctx = TransformContext {
            stack: vec!["weld".into(), "dedup".into(), "prune".into()],
            cursor: 1,
        };
        assert!(ctx.is_pending("prune"));
        assert!(!ctx.is_pending("weld"));
        assert!(!ctx.is_pending("dedup"));
        assert_eq!(ctx.current(), Some("dedup"));
    }

    #[test]
    fn pipeline_runs_in_order() {
        let mut doc = Document::new();
        doc.transform(vec![
            Transform::new("first", |doc, ctx| {
                assert!(ctx.is_pending("second"));
                doc.create_scene("from-first");
                Ok(())
            }),
            Transform::new("second", |doc, ctx| {
                assert!(!ctx.is_pending("first"));
                assert_eq!(doc.scenes().len(), 1);
                Ok(())
            }),
        ])
        .unwrap();
    }
}
