//! composer.json analysis and EE → CE rewrite

use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, info};

use crate::error::ComposerError;

pub const EE_PACKAGE: &str = "magento/product-enterprise-edition";
pub const CE_PACKAGE: &str = "magento/product-community-edition";
pub const CLOUD_METAPACKAGE: &str = "magento/magento-cloud-metapackage";

/// Packages that only exist for Adobe Commerce
pub const EE_DEPENDENT_PACKAGES: &[&str] = &[
    "magento/module-staging",
    "magento/module-visual-merchandiser",
    "magento/module-gift-card",
    "magento/module-gift-card-account",
    "magento/module-gift-registry",
    "magento/module-gift-wrapping",
    "magento/module-reward",
    "magento/module-rma",
    "magento/module-customer-balance",
    "magento/module-banner",
    "magento/module-search-staging",
    "magento/module-catalog-staging",
    "magento/module-cms-staging",
    "magento/module-sales-rule-staging",
    "magento/module-catalog-rule-staging",
    "magento/module-checkout-staging",
    "magento/module-payment-staging",
];

/// Repository URL fragments that need a community equivalent after migration
const ENTERPRISE_REPOSITORY_PATTERNS: &[(&str, &str)] = &[(
    "composer.amasty.com/enterprise/",
    "Amasty Enterprise repository - may need to switch to community version",
)];

/// Files inspected for enterprise repository URLs
const REPOSITORY_FILES: &[&str] = &["composer.json", "composer.lock"];

/// Parsed composer.json plus the facts the migration needs
#[derive(Debug, Clone)]
pub struct ComposerAnalysis {
    pub data: Map<String, Value>,
    /// Constraint on the EE metapackage, if required
    pub ee_version: Option<String>,
    pub replace_keys: Vec<String>,
}

impl ComposerAnalysis {
    pub fn is_enterprise_edition(&self) -> bool {
        self.ee_version.is_some()
    }

    /// Number of `replace` entries the migration will drop
    pub fn magento_replace_count(&self) -> usize {
        self.replace_keys
            .iter()
            .filter(|k| k.starts_with("magento/"))
            .count()
    }

    fn section(&self, name: &str) -> Option<&Map<String, Value>> {
        self.data.get(name).and_then(Value::as_object)
    }

    fn requires(&self, package: &str) -> bool {
        self.section("require")
            .is_some_and(|r| r.contains_key(package))
    }
}

/// An EE-only package found in `require` or `require-dev`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageConflict {
    pub package: String,
    pub version: String,
    pub message: String,
}

/// An enterprise repository URL found in a composer file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryFinding {
    pub pattern: String,
    pub file: String,
    pub message: String,
}

/// Read and parse `composer.json`
pub fn analyse(path: &Path) -> Result<ComposerAnalysis, ComposerError> {
    if !path.is_file() {
        return Err(ComposerError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|_| ComposerError::NotFound {
        path: path.to_path_buf(),
    })?;

    let data: Map<String, Value> =
        serde_json::from_str(&content).map_err(|e| ComposerError::InvalidJson {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let ee_version = data
        .get("require")
        .and_then(|r| r.get(EE_PACKAGE))
        .and_then(Value::as_str)
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    let replace_keys = data
        .get("replace")
        .and_then(Value::as_object)
        .map(|r| r.keys().cloned().collect())
        .unwrap_or_default();

    debug!(?ee_version, "Analysed {}", path.display());

    Ok(ComposerAnalysis {
        data,
        ee_version,
        replace_keys,
    })
}

/// EE-only packages, in catalog order
pub fn detect_conflicts(analysis: &ComposerAnalysis) -> Vec<PackageConflict> {
    let require = analysis.section("require");
    let require_dev = analysis.section("require-dev");

    EE_DEPENDENT_PACKAGES
        .iter()
        .filter_map(|package| {
            // require-dev wins when a package is listed in both
            let version = require_dev
                .and_then(|r| r.get(*package))
                .or_else(|| require.and_then(|r| r.get(*package)))?;

            Some(PackageConflict {
                package: package.to_string(),
                version: version_text(version),
                message: format!(
                    "EE-only package found: {}. This will not be available in CE.",
                    package
                ),
            })
        })
        .collect()
}

/// Metapackages removed from `require` before CE is added
pub fn packages_to_remove(analysis: &ComposerAnalysis) -> Vec<&'static str> {
    [EE_PACKAGE, CE_PACKAGE, CLOUD_METAPACKAGE]
        .into_iter()
        .filter(|p| analysis.requires(p))
        .collect()
}

/// The CE metapackage and its constraint, derived from the EE constraint
pub fn packages_to_add(analysis: &ComposerAnalysis) -> Option<(&'static str, String)> {
    analysis
        .ee_version
        .as_deref()
        .map(|v| (CE_PACKAGE, strip_patch_suffix(v).to_string()))
}

/// `2.4.7-p8` → `2.4.7`, `^2.4.7-p3` → `^2.4.7`
pub fn strip_patch_suffix(version: &str) -> &str {
    match version.rfind("-p") {
        Some(idx)
            if idx + 2 < version.len()
                && version[idx + 2..].bytes().all(|b| b.is_ascii_digit()) =>
        {
            &version[..idx]
        }
        _ => version,
    }
}

/// Look for enterprise-only repository URLs in composer.json and composer.lock
pub fn detect_enterprise_repositories(magento_root: &Path) -> Vec<RepositoryFinding> {
    let mut findings = Vec::new();

    for filename in REPOSITORY_FILES {
        let Ok(content) = std::fs::read_to_string(magento_root.join(filename)) else {
            continue;
        };

        for (pattern, message) in ENTERPRISE_REPOSITORY_PATTERNS {
            if content.contains(pattern) {
                findings.push(RepositoryFinding {
                    pattern: pattern.to_string(),
                    file: filename.to_string(),
                    message: message.to_string(),
                });
            }
        }
    }

    findings
}

/// Rewrite composer.json: drop the EE metapackage, require CE and clear
/// `magento/*` replace entries. Other keys keep their order.
pub fn migrate(path: &Path, analysis: &ComposerAnalysis) -> Result<(), ComposerError> {
    let mut data = analysis.data.clone();

    if let Some(require) = data.get_mut("require").and_then(Value::as_object_mut) {
        require.shift_remove(EE_PACKAGE);
        if let Some((package, version)) = packages_to_add(analysis) {
            require.insert(package.to_string(), Value::String(version));
        }
    }

    let replace_now_empty = match data.get_mut("replace").and_then(Value::as_object_mut) {
        Some(replace) => {
            replace.retain(|key, _| !key.starts_with("magento/"));
            replace.is_empty()
        }
        None => false,
    };
    if replace_now_empty {
        data.shift_remove("replace");
    }

    let mut json = to_pretty_json(&Value::Object(data)).map_err(|e| ComposerError::InvalidJson {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    json.push('\n');

    std::fs::write(path, json).map_err(|source| ComposerError::WriteFailed {
        path: path.to_path_buf(),
        source,
    })?;

    info!("Rewrote {}", path.display());
    Ok(())
}

/// Pretty JSON with four-space indentation, as composer writes it
fn to_pretty_json(value: &Value) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn version_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
