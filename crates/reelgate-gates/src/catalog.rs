//! String-keyed gate factories.
//!
//! Policies name gates by string. The catalog maps each name to a
//! [`GateDescriptor`] holding up to two constructors: one that accepts the
//! configured severity and one that does not. Built-in gates are registered
//! by [`GateCatalog::builtin`]; hosts add more through [`GatePlugin`].

use std::sync::Arc;

use reelgate_core::config::QualityPolicy;
use reelgate_core::errors::GateError;
use reelgate_core::schema::StructuralSchema;
use reelgate_core::types::{ArtifactKind, Severity};
use reelgate_storage::DedupIndex;
use rustc_hash::FxHashMap;

use crate::audio::silence::SilenceLimits;
use crate::audio::{
    default_probe, AudioFormatGate, AudioProbe, DurationConsistencyGate, LoudnessGate, SilenceGate,
};
use crate::gate::Gate;
use crate::script::{
    CompletenessGate, DuplicatesGate, ForbiddenTermsGate, LanguageGate, SchemaGate, WordBoundsGate,
};

pub type BoxedGate = Box<dyn Gate>;

pub type SeverityCtor =
    Arc<dyn Fn(&GateContext<'_>, Severity) -> Result<BoxedGate, GateError> + Send + Sync>;

pub type PlainCtor = Arc<dyn Fn(&GateContext<'_>) -> Result<BoxedGate, GateError> + Send + Sync>;

/// Shared handles gates may need at construction.
#[derive(Clone)]
pub struct GateResources {
    pub probe: Arc<dyn AudioProbe>,
    /// Required by the duplicates gate only.
    pub dedup: Option<Arc<DedupIndex>>,
}

impl Default for GateResources {
    fn default() -> Self {
        Self {
            probe: default_probe(),
            dedup: None,
        }
    }
}

impl GateResources {
    pub fn with_probe(mut self, probe: Arc<dyn AudioProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_dedup(mut self, index: Arc<DedupIndex>) -> Self {
        self.dedup = Some(index);
        self
    }
}

/// What a constructor sees: the name it is built under, the policy and the
/// shared resources.
pub struct GateContext<'a> {
    pub name: &'a str,
    pub policy: &'a QualityPolicy,
    pub resources: &'a GateResources,
}

impl GateContext<'_> {
    fn construction_error(&self, message: impl Into<String>) -> GateError {
        GateError::Construction {
            gate: self.name.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Clone)]
pub struct GateDescriptor {
    name: String,
    kind: ArtifactKind,
    with_severity: Option<SeverityCtor>,
    plain: Option<PlainCtor>,
}

impl GateDescriptor {
    pub fn with_severity<F>(name: &str, kind: ArtifactKind, ctor: F) -> Self
    where
        F: Fn(&GateContext<'_>, Severity) -> Result<BoxedGate, GateError> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            kind,
            with_severity: Some(Arc::new(ctor)),
            plain: None,
        }
    }

    /// A gate that picks its own severity.
    pub fn plain<F>(name: &str, kind: ArtifactKind, ctor: F) -> Self
    where
        F: Fn(&GateContext<'_>) -> Result<BoxedGate, GateError> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            kind,
            with_severity: None,
            plain: Some(Arc::new(ctor)),
        }
    }

    /// Add a severity-less fallback constructor.
    pub fn or_plain<F>(mut self, ctor: F) -> Self
    where
        F: Fn(&GateContext<'_>) -> Result<BoxedGate, GateError> + Send + Sync + 'static,
    {
        self.plain = Some(Arc::new(ctor));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    /// Try the severity-accepting constructor, then the plain one.
    pub fn construct(&self, ctx: &GateContext<'_>, severity: Severity) -> Result<BoxedGate, GateError> {
        let mut last_err = None;
        if let Some(ctor) = &self.with_severity {
            match ctor(ctx, severity) {
                Ok(gate) => return Ok(gate),
                Err(e) => last_err = Some(e),
            }
        }
        if let Some(ctor) = &self.plain {
            match ctor(ctx) {
                Ok(gate) => return Ok(gate),
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or_else(|| ctx.construction_error("no constructor registered")))
    }
}

impl std::fmt::Debug for GateDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("with_severity", &self.with_severity.is_some())
            .field("plain", &self.plain.is_some())
            .finish()
    }
}

/// A source of extra gates, registered by the host at startup.
pub trait GatePlugin: Send + Sync {
    fn name(&self) -> &str;

    fn descriptors(&self) -> Vec<GateDescriptor>;
}

#[derive(Debug, Clone, Default)]
pub struct GateCatalog {
    entries: FxHashMap<String, GateDescriptor>,
}

impl GateCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every built-in gate, under its canonical name and its aliases.
    pub fn builtin() -> Self {
        let mut catalog = Self::empty();
        for desc in builtin_descriptors() {
            catalog.register(desc);
        }
        catalog
    }

    pub fn with_plugins<'p, I>(mut self, plugins: I) -> Self
    where
        I: IntoIterator<Item = &'p dyn GatePlugin>,
    {
        for plugin in plugins {
            self.register_plugin(plugin);
        }
        self
    }

    /// Returns `false` and keeps the existing entry when the name is taken.
    pub fn register(&mut self, descriptor: GateDescriptor) -> bool {
        if self.entries.contains_key(descriptor.name()) {
            tracing::warn!(gate = descriptor.name(), "gate name already registered; ignoring");
            return false;
        }
        self.entries.insert(descriptor.name().to_string(), descriptor);
        true
    }

    /// Register a plugin's descriptors. Returns how many were accepted.
    pub fn register_plugin(&mut self, plugin: &dyn GatePlugin) -> usize {
        let accepted = plugin
            .descriptors()
            .into_iter()
            .filter(|d| self.register(d.clone()))
            .count();
        tracing::info!(plugin = plugin.name(), accepted, "registered gate plugin");
        accepted
    }

    pub fn get(&self, name: &str) -> Option<&GateDescriptor> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Sorted names for `kind`.
    pub fn names(&self, kind: ArtifactKind) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .entries
            .values()
            .filter(|d| d.kind == kind)
            .map(GateDescriptor::name)
            .collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn builtin_descriptors() -> Vec<GateDescriptor> {
    use ArtifactKind::{Audio, Script};

    let mut out = vec![
        GateDescriptor::with_severity("schema_validation", Script, schema_gate),
        GateDescriptor::with_severity("word_bounds", Script, |ctx, sev| {
            let p = &ctx.policy.script;
            Ok(Box::new(WordBoundsGate::new(
                ctx.name,
                sev,
                p.effective_min_words(),
                p.effective_max_words(),
            )))
        }),
        GateDescriptor::with_severity("forbidden_terms", Script, forbidden_terms_gate),
        GateDescriptor::with_severity("language", Script, |ctx, sev| {
            Ok(Box::new(LanguageGate::new(
                ctx.name,
                sev,
                ctx.policy.script.effective_language(),
            )))
        }),
        GateDescriptor::with_severity("script_completeness", Script, |ctx, sev| {
            Ok(Box::new(CompletenessGate::new(ctx.name, sev, ctx.policy.llm_assisted)))
        }),
        GateDescriptor::with_severity("duplicates", Script, |ctx, sev| {
            let index = ctx
                .resources
                .dedup
                .clone()
                .ok_or_else(|| ctx.construction_error("no dedup index configured"))?;
            Ok(Box::new(DuplicatesGate::new(
                ctx.name,
                sev,
                index,
                ctx.policy.script.effective_allow_duplicates(),
            )))
        }),
        GateDescriptor::with_severity("audio_format", Audio, |ctx, sev| {
            Ok(Box::new(AudioFormatGate::new(
                ctx.name,
                sev,
                ctx.policy.audio.effective_min_sample_rate(),
                ctx.resources.probe.clone(),
            )))
        }),
        GateDescriptor::with_severity("duration_consistency", Audio, |ctx, sev| {
            Ok(Box::new(DurationConsistencyGate::new(
                ctx.name,
                sev,
                ctx.policy.audio.effective_words_per_second(),
                ctx.resources.probe.clone(),
            )))
        }),
    ];
    for name in ["silence", "silence_detection"] {
        out.push(GateDescriptor::with_severity(name, Audio, silence_gate));
    }
    for name in ["loudness", "loudness_check"] {
        out.push(GateDescriptor::with_severity(name, Audio, |ctx, sev| {
            Ok(Box::new(LoudnessGate::new(
                ctx.name,
                sev,
                ctx.policy.audio.effective_loudness_range(),
                ctx.resources.probe.clone(),
            )))
        }));
    }
    out
}

fn schema_gate(ctx: &GateContext<'_>, sev: Severity) -> Result<BoxedGate, GateError> {
    let (schema, shown_path) = match &ctx.policy.script.schema_path {
        Some(rel) => {
            let path = ctx.policy.resolve(rel);
            let schema =
                StructuralSchema::load(&path).map_err(|e| ctx.construction_error(e.to_string()))?;
            (schema, Some(path.display().to_string()))
        }
        None => (StructuralSchema::script_v1(), None),
    };
    Ok(Box::new(SchemaGate::new(ctx.name, sev, schema, shown_path)))
}

fn forbidden_terms_gate(ctx: &GateContext<'_>, sev: Severity) -> Result<BoxedGate, GateError> {
    let p = &ctx.policy.script;
    let mut terms = p.forbidden_terms.clone();
    if let Some(rel) = &p.forbidden_terms_file {
        let from_file = ForbiddenTermsGate::from_file(ctx.name, sev, &ctx.policy.resolve(rel))?;
        terms.extend(from_file.terms().iter().cloned());
    }
    Ok(Box::new(ForbiddenTermsGate::new(ctx.name, sev, terms)))
}

fn silence_gate(ctx: &GateContext<'_>, sev: Severity) -> Result<BoxedGate, GateError> {
    let a = &ctx.policy.audio;
    let limits = SilenceLimits {
        max_leading_ms: a.effective_max_leading_silence_ms(),
        max_trailing_ms: a.effective_max_trailing_silence_ms(),
        max_proportion: a.effective_max_silence_proportion(),
        threshold_dbfs: a.effective_silence_threshold_dbfs(),
    };
    Ok(Box::new(SilenceGate::new(ctx.name, sev, limits, ctx.resources.probe.clone())))
}
