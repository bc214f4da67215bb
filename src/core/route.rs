//! # Router
//!
//! Translates a location fragment into a `(RouteDescriptor, params)` pair.
//!
//! ```text
//! "#/topics/history"
//!        │
//!        ▼  normalize ("/topics/history")
//!  ┌─────────────────────────────┐
//!  │ /          → home           │  registration order = priority
//!  │ /topics    → topic-list     │
//!  │ /topics/:categoryId ─────── │──▶ RouteMatch { topic-list, {categoryId: "history"} }
//!  │ ...                         │
//!  └─────────────────────────────┘
//! ```
//!
//! Each pattern is compiled once at construction: `:name` segments become
//! `([^/]+)`, every other segment is matched literally, and the whole thing
//! is anchored. The first pattern that matches wins.
//!
//! Captured values are handed back exactly as they appeared in the path.
//! Percent-decoding is left to the module that consumes the value.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use log::{debug, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Module every unmatched path is redirected to.
pub const DEFAULT_MODULE: &str = "home";

// ============================================================================
// Route Table Types
// ============================================================================

/// Static metadata mapping a URL pattern to a module and display info.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDescriptor {
    /// Pattern such as `/topics/:categoryId`.
    pub path: String,
    pub module_id: String,
    /// Human-readable name shown in the nav and title bar.
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    /// Listed in the sidebar nav.
    #[serde(default)]
    pub nav: bool,
    /// Listed in the footer links.
    #[serde(default)]
    pub footer: bool,
    /// Module takes the whole viewport (no sidebar).
    #[serde(default)]
    pub full_bleed: bool,
}

impl RouteDescriptor {
    pub fn new(path: &str, module_id: &str, name: &str) -> Self {
        Self {
            path: path.to_string(),
            module_id: module_id.to_string(),
            name: name.to_string(),
            icon: None,
            nav: false,
            footer: false,
            full_bleed: false,
        }
    }

    pub fn icon(mut self, icon: &str) -> Self {
        self.icon = Some(icon.to_string());
        self
    }

    pub fn in_nav(mut self) -> Self {
        self.nav = true;
        self
    }

    pub fn in_footer(mut self) -> Self {
        self.footer = true;
        self
    }

    pub fn full_bleed(mut self) -> Self {
        self.full_bleed = true;
        self
    }
}

/// Route parameters extracted from a matched path, keyed by segment name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteParams(BTreeMap<String, String>);

impl RouteParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Percent-decoded value of `name`. Invalid escapes are kept as written.
    pub fn decoded(&self, name: &str) -> Option<String> {
        self.get(name).map(percent_decode)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RouteParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

fn percent_decode(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let escaped = (bytes[i] == b'%')
            .then(|| raw.get(i + 1..i + 3))
            .flatten()
            .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
            .and_then(|hex| u8::from_str_radix(hex, 16).ok());
        match escaped {
            Some(byte) => {
                out.push(byte);
                i += 3;
            }
            None => {
                out.push(bytes[i]);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Result of a successful resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteMatch {
    pub route: Arc<RouteDescriptor>,
    pub params: RouteParams,
}

/// A resolution after the redirect policy has been applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub matched: RouteMatch,
    /// The normalized path that failed to match, when a redirect happened.
    pub redirected_from: Option<String>,
}

// ============================================================================
// Errors
// ============================================================================

/// No registered pattern matches the path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoRouteFound {
    pub path: String,
}

impl fmt::Display for NoRouteFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no route matches '{}'", self.path)
    }
}

impl std::error::Error for NoRouteFound {}

/// A route table entry that cannot be compiled.
#[derive(Debug)]
pub enum RouteTableError {
    /// `:` segment with no name, e.g. `/quiz/:`.
    EmptyParam { pattern: String },
    /// The same `:name` used twice in one pattern.
    DuplicateParam { pattern: String, name: String },
    Regex { pattern: String, source: regex::Error },
    /// The redirect target has no route without parameters.
    MissingDefault { module_id: String },
}

impl fmt::Display for RouteTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteTableError::EmptyParam { pattern } => {
                write!(f, "route pattern '{pattern}' has an unnamed parameter")
            }
            RouteTableError::DuplicateParam { pattern, name } => {
                write!(f, "route pattern '{pattern}' repeats parameter ':{name}'")
            }
            RouteTableError::Regex { pattern, source } => {
                write!(f, "route pattern '{pattern}' failed to compile: {source}")
            }
            RouteTableError::MissingDefault { module_id } => {
                write!(f, "default module '{module_id}' needs a route without parameters")
            }
        }
    }
}

impl std::error::Error for RouteTableError {}

// ============================================================================
// Pattern Compilation
// ============================================================================

struct CompiledRoute {
    descriptor: Arc<RouteDescriptor>,
    matcher: Regex,
    param_names: Vec<String>,
}

/// Strips a leading `#` and guarantees a leading `/`.
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim();
    let trimmed = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

fn compile_pattern(pattern: &str) -> Result<(Regex, Vec<String>), RouteTableError> {
    let normalized = normalize_path(pattern);
    let mut param_names: Vec<String> = Vec::new();
    let mut parts = Vec::new();

    for segment in normalized.split('/') {
        match segment.strip_prefix(':') {
            Some("") => {
                return Err(RouteTableError::EmptyParam {
                    pattern: pattern.to_string(),
                });
            }
            Some(name) => {
                if param_names.iter().any(|n| n == name) {
                    return Err(RouteTableError::DuplicateParam {
                        pattern: pattern.to_string(),
                        name: name.to_string(),
                    });
                }
                param_names.push(name.to_string());
                parts.push("([^/]+)".to_string());
            }
            None => parts.push(regex::escape(segment)),
        }
    }

    let source = format!("^{}$", parts.join("/"));
    let matcher = Regex::new(&source).map_err(|source| RouteTableError::Regex {
        pattern: pattern.to_string(),
        source,
    })?;
    Ok((matcher, param_names))
}

// ============================================================================
// Router
// ============================================================================

/// Ordered, immutable route table.
pub struct Router {
    routes: Vec<CompiledRoute>,
    default_module: String,
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes.len())
            .field("default_module", &self.default_module)
            .finish()
    }
}

impl Router {
    /// Compiles the table with [`DEFAULT_MODULE`] as the redirect target.
    ///
    /// Every table must give its default module a parameterless route, so
    /// unknown paths always have somewhere to land.
    pub fn new(routes: Vec<RouteDescriptor>) -> Result<Self, RouteTableError> {
        Self::with_default(routes, DEFAULT_MODULE)
    }

    pub fn with_default(
        routes: Vec<RouteDescriptor>,
        default_module: &str,
    ) -> Result<Self, RouteTableError> {
        let routes = routes
            .into_iter()
            .map(|descriptor| {
                let (matcher, param_names) = compile_pattern(&descriptor.path)?;
                Ok(CompiledRoute {
                    descriptor: Arc::new(descriptor),
                    matcher,
                    param_names,
                })
            })
            .collect::<Result<Vec<_>, RouteTableError>>()?;

        if !routes
            .iter()
            .any(|r| r.descriptor.module_id == default_module && r.param_names.is_empty())
        {
            return Err(RouteTableError::MissingDefault {
                module_id: default_module.to_string(),
            });
        }

        Ok(Self {
            routes,
            default_module: default_module.to_string(),
        })
    }

    /// First route (in registration order) whose pattern matches `path`.
    pub fn resolve(&self, path: &str) -> Result<RouteMatch, NoRouteFound> {
        let normalized = normalize_path(path);

        for route in &self.routes {
            let Some(captures) = route.matcher.captures(&normalized) else {
                continue;
            };
            let params = route
                .param_names
                .iter()
                .zip(captures.iter().skip(1))
                .filter_map(|(name, m)| m.map(|m| (name.clone(), m.as_str().to_string())))
                .collect();
            debug!("Resolved '{}' to module '{}'", normalized, route.descriptor.module_id);
            return Ok(RouteMatch {
                route: route.descriptor.clone(),
                params,
            });
        }

        Err(NoRouteFound { path: normalized })
    }

    /// Resolves `path`, falling back to the default module exactly once.
    pub fn resolve_or_default(&self, path: &str) -> Result<Resolution, NoRouteFound> {
        match self.resolve(path) {
            Ok(matched) => Ok(Resolution {
                matched,
                redirected_from: None,
            }),
            Err(not_found) => {
                warn!("{not_found}; redirecting to '{}'", self.default_module);
                let route = self
                    .routes
                    .iter()
                    .find(|r| r.descriptor.module_id == self.default_module && r.param_names.is_empty())
                    .ok_or_else(|| not_found.clone())?;
                Ok(Resolution {
                    matched: RouteMatch {
                        route: route.descriptor.clone(),
                        params: RouteParams::new(),
                    },
                    redirected_from: Some(not_found.path),
                })
            }
        }
    }

    /// Builds a `#/...` fragment for the first route of `module_id` whose
    /// parameters are all supplied.
    pub fn href(&self, module_id: &str, params: &RouteParams) -> Option<String> {
        let route = self.routes.iter().find(|r| {
            r.descriptor.module_id == module_id
                && r.param_names.iter().all(|n| params.get(n).is_some())
        })?;

        let path = normalize_path(&route.descriptor.path)
            .split('/')
            .map(|segment| match segment.strip_prefix(':') {
                Some(name) => params.get(name).unwrap_or_default().to_string(),
                None => segment.to_string(),
            })
            .collect::<Vec<_>>()
            .join("/");
        Some(format!("#{path}"))
    }

    /// Fragment for the default module.
    pub fn home_href(&self) -> String {
        self.href(&self.default_module, &RouteParams::new())
            .unwrap_or_else(|| format!("#/{}", self.default_module))
    }

    pub fn default_module(&self) -> &str {
        &self.default_module
    }

    pub fn routes(&self) -> impl Iterator<Item = &RouteDescriptor> {
        self.routes.iter().map(|r| r.descriptor.as_ref())
    }

    pub fn nav_routes(&self) -> impl Iterator<Item = &RouteDescriptor> {
        self.routes().filter(|r| r.nav)
    }

    pub fn footer_routes(&self) -> impl Iterator<Item = &RouteDescriptor> {
        self.routes().filter(|r| r.footer)
    }
}

/// The quiz application's route table.
pub fn default_routes() -> Vec<RouteDescriptor> {
    vec![
        RouteDescriptor::new("/", "home", "Home").icon("⌂").full_bleed(),
        RouteDescriptor::new("/home", "home", "Home").icon("⌂").in_nav().full_bleed(),
        RouteDescriptor::new("/topics", "topic-list", "Topics").icon("☰").in_nav(),
        RouteDescriptor::new("/topics/:categoryId", "topic-list", "Topics").icon("☰"),
        RouteDescriptor::new("/quiz/:topicId", "quiz", "Quiz").icon("?").full_bleed(),
        RouteDescriptor::new("/results", "results", "Results").icon("✓").in_nav(),
        RouteDescriptor::new("/learning-path", "learning-path", "Learning Paths").icon("↗").in_nav(),
        RouteDescriptor::new("/learning-path/:pathId", "learning-path", "Learning Paths").icon("↗"),
        RouteDescriptor::new(
            "/learning-path/:pathId/level/:levelId",
            "learning-path",
            "Learning Paths",
        )
        .icon("↗"),
        RouteDescriptor::new("/settings", "settings", "Settings").icon("⚙").in_nav().in_footer(),
    ]
}
