// © 2019 3D Robotics. License: Apache-2.0
//! `SourceDescriptor::Dynamic` has no state of its own — `build()` just
//! invokes the caller's function and recurses into whatever descriptor it
//! returns (see [`super::SourceDescriptor::build`]). This module holds only
//! the tests for that recursive-build behavior.

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use crate::error::SourceError;
    use crate::source::{ReadOutcome, SourceDescriptor};

    #[tokio::test]
    async fn resolves_to_the_returned_descriptor() {
        let descriptor = SourceDescriptor::Dynamic(Arc::new(|| Ok(SourceDescriptor::Random(16))));
        let mut source = descriptor.build().await.unwrap();
        let mut total = 0;
        loop {
            match source.read().await.unwrap() {
                ReadOutcome::Chunk(c) => total += c.len(),
                ReadOutcome::Eof => break,
            }
        }
        assert_eq!(total, 16);
    }

    #[tokio::test]
    async fn function_error_surfaces_as_dynamic_build_error() {
        let descriptor: SourceDescriptor =
            SourceDescriptor::Dynamic(Arc::new(|| Err(SourceError::UnknownKind)));
        let err = descriptor.build().await.unwrap_err();
        assert!(matches!(err, SourceError::DynamicBuild(_)));
    }
}
