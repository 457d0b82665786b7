//! Signature verification tasks

use crate::{ComputeEngine, ComputeError};
use std::sync::Arc;

/// Batch Ed25519 signature verification (consensus vote tallying).
pub struct BatchEd25519VerifyTask {
    pub messages: Vec<Vec<u8>>,
    pub signatures: Vec<[u8; 64]>,
    pub public_keys: Vec<[u8; 32]>,
}

/// Verification result for a batch
#[derive(Debug, Clone)]
pub struct BatchVerifyResult {
    pub results: Vec<bool>,
    pub valid_count: usize,
    pub invalid_count: usize,
}

impl BatchEd25519VerifyTask {
    /// Execute batch verification
    pub async fn execute(
        self,
        engine: &Arc<dyn ComputeEngine>,
    ) -> Result<BatchVerifyResult, ComputeError> {
        let results = engine
            .batch_verify_ed25519(&self.messages, &self.signatures, &self.public_keys)
            .await?;

        let valid_count = results.iter().filter(|&&v| v).count();
        let invalid_count = results.len() - valid_count;

        Ok(BatchVerifyResult {
            results,
            valid_count,
            invalid_count,
        })
    }
}

/// Single Ed25519 verification (convenience wrapper)
pub struct Ed25519VerifyTask {
    pub message: Vec<u8>,
    pub signature: [u8; 64],
    pub public_key: [u8; 32],
}

impl Ed25519VerifyTask {
    /// Execute single verification
    pub async fn execute(self, engine: &Arc<dyn ComputeEngine>) -> Result<bool, ComputeError> {
        let results = engine
            .batch_verify_ed25519(
                &[self.message],
                &[self.signature],
                &[self.public_key],
            )
            .await?;

        Ok(results.first().copied().unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::cpu::CpuEngine;
    use lucid_crypto::Ed25519KeyPair;

    #[tokio::test]
    async fn batch_task_counts_valid_and_invalid() {
        let engine: Arc<dyn ComputeEngine> = Arc::new(CpuEngine::new());
        let good_pair = Ed25519KeyPair::generate();
        let bad_pair = Ed25519KeyPair::generate();
        let message = b"anchor vote".to_vec();

        let good_sig = good_pair.sign(&message);
        let bad_sig = bad_pair.sign(b"different message");

        let task = BatchEd25519VerifyTask {
            messages: vec![message.clone(), message],
            signatures: vec![*good_sig.as_bytes(), *bad_sig.as_bytes()],
            public_keys: vec![
                *good_pair.public_key().as_bytes(),
                *bad_pair.public_key().as_bytes(),
            ],
        };

        let result = task.execute(&engine).await.unwrap();
        assert_eq!(result.valid_count, 1);
        assert_eq!(result.invalid_count, 1);
    }
}
