//! Provider selector.
//!
//! Turns a [`ChatRequest`] into an ordered list of [`Candidate`]s:
//!
//! 1. An explicit provider, if given, is candidate #1.
//! 2. The message is classified; a task group goes ahead of the
//!    reliability tiers (primary, secondary, fallback).
//! 3. Each group's members are shuffled independently per request.
//! 4. Duplicates are dropped, keeping the first occurrence.
//!
//! Providers that require credentials are only used when named explicitly.

use std::collections::HashSet;
use std::sync::Arc;

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;

use crate::catalog::ProviderCatalog;
use crate::classifier::{KeywordClassifier, TaskProfile};
use crate::error::GatewayError;
use crate::types::{Candidate, ChatRequest};

/// Builds the per-request try order from the catalog.
#[derive(Debug, Clone)]
pub struct ProviderSelector {
    catalog: Arc<ProviderCatalog>,
    classifier: KeywordClassifier,
}

impl ProviderSelector {
    /// Create a selector over `catalog`.
    pub fn new(catalog: Arc<ProviderCatalog>) -> Self {
        Self {
            catalog,
            classifier: KeywordClassifier::new(),
        }
    }

    /// The catalog this selector reads.
    pub fn catalog(&self) -> &ProviderCatalog {
        &self.catalog
    }

    /// Classify `message` and return the group names it falls through.
    pub fn group_order(&self, message: &str) -> (TaskProfile, Vec<&'static str>) {
        let profile = self.classifier.classify(message);
        let groups = self.catalog.groups_for(profile.tag);
        (profile, groups)
    }

    /// Select candidates using the thread-local random source.
    pub fn select(&self, request: &ChatRequest) -> Result<Vec<Candidate>, GatewayError> {
        self.select_with_rng(request, &mut rand::thread_rng())
    }

    /// Select candidates using `rng` for the per-group shuffle.
    ///
    /// # Errors
    ///
    /// [`GatewayError::UnknownProvider`] when the explicit provider is not in
    /// the catalog.
    pub fn select_with_rng<R: Rng + ?Sized>(
        &self,
        request: &ChatRequest,
        rng: &mut R,
    ) -> Result<Vec<Candidate>, GatewayError> {
        let model_for = |default: &str| {
            request
                .explicit_model
                .clone()
                .unwrap_or_else(|| default.to_owned())
        };

        let mut seen: HashSet<String> = HashSet::new();
        let mut candidates = Vec::new();
        let mut tier = 0;

        if let Some(ref name) = request.explicit_provider {
            let descriptor = self.catalog.lookup(name)?;
            seen.insert(descriptor.name.clone());
            let mut candidate = Candidate::new(
                descriptor.name.clone(),
                model_for(&descriptor.default_model),
                tier,
            );
            candidate.supports_stream = descriptor.supports_stream;
            candidates.push(candidate);
            tier += 1;
        }

        let (profile, groups) = self.group_order(&request.message);
        for group in &groups {
            let mut members = self.catalog.members_of(group);
            members.shuffle(rng);
            for descriptor in members {
                if descriptor.requires_auth || !seen.insert(descriptor.name.clone()) {
                    continue;
                }
                let mut candidate = Candidate::new(
                    descriptor.name.clone(),
                    model_for(&descriptor.default_model),
                    tier,
                );
                candidate.supports_stream = descriptor.supports_stream;
                candidates.push(candidate);
            }
            tier += 1;
        }

        debug!(
            task = ?profile.tag,
            groups = ?groups,
            candidates = candidates.len(),
            "selected candidates"
        );

        Ok(candidates)
    }
}

/// Re-shuffle candidates within each tier, keeping tiers in order.
pub fn reshuffle<R: Rng + ?Sized>(candidates: &mut [Candidate], rng: &mut R) {
    for run in candidates.chunk_by_mut(|a, b| a.tier == b.tier) {
        run.shuffle(rng);
    }
}
