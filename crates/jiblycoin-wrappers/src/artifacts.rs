//! Loading of compiled contract artifacts.
//!
//! Both Hardhat (`artifacts/contracts/<File>.sol/<Name>.json`, `bytecode` is
//! a hex string) and Foundry (`out/<File>.sol/<Name>.json`, `bytecode` is an
//! object holding the hex string) layouts are understood, as well as a flat
//! directory of `<Name>.json` files.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use ethers::{
    abi::{Abi, Function},
    types::Bytes,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("no artifact named {name} under {}", .root.display())]
    NotFound { name: String, root: PathBuf },
    #[error("more than one artifact named {name}: {paths:?}")]
    Ambiguous { name: String, paths: Vec<PathBuf> },
    #[error("failed to read artifact {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse artifact {}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("artifact {name} has invalid bytecode: {reason}")]
    Bytecode { name: String, reason: String },
    #[error("artifact {name} has no creation bytecode (interface or abstract contract)")]
    NotDeployable { name: String },
}

/// A compiled contract: its interface and creation bytecode.
#[derive(Clone, Debug)]
pub struct Artifact {
    pub name: String,
    pub abi: Abi,
    pub bytecode: Bytes,
    /// The ABI's functions in declaration order. [`Abi`] itself keys
    /// functions by name, which loses that order.
    functions: Vec<Function>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifact {
    contract_name: Option<String>,
    abi: Vec<Value>,
    #[serde(default)]
    bytecode: RawBytecode,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBytecode {
    Hex(String),
    Object { object: String },
}

impl Default for RawBytecode {
    fn default() -> Self {
        Self::Hex(String::new())
    }
}

impl RawBytecode {
    fn hex(&self) -> &str {
        match self {
            Self::Hex(hex) | Self::Object { object: hex } => hex,
        }
    }
}

impl Artifact {
    /// Parses an artifact from its JSON text. `fallback_name` is used when the
    /// artifact does not carry a `contractName` (Foundry output).
    pub fn from_json(json: &str, fallback_name: &str) -> Result<Self, serde_json::Error> {
        let raw: RawArtifact = serde_json::from_str(json)?;
        let abi: Abi = serde_json::from_value(Value::Array(raw.abi.clone()))?;

        // Recover declaration order by walking the raw entries and picking
        // overloads off the name-keyed map in the order they were declared.
        let mut seen = HashMap::<&str, usize>::new();
        let functions = raw
            .abi
            .iter()
            .filter(|item| item.get("type").and_then(Value::as_str) == Some("function"))
            .filter_map(|item| {
                let name = item.get("name")?.as_str()?;
                let index = seen.entry(name).or_default();
                let function = abi.functions.get(name)?.get(*index)?.clone();
                *index += 1;
                Some(function)
            })
            .collect();

        Ok(Self {
            name: raw
                .contract_name
                .unwrap_or_else(|| fallback_name.to_string()),
            abi,
            bytecode: parse_bytecode(raw.bytecode.hex()).unwrap_or_default(),
            functions,
        })
    }

    /// The callable functions of the contract, in declaration order.
    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    pub fn is_deployable(&self) -> bool {
        !self.bytecode.is_empty()
    }
}

/// Parses hex creation bytecode. Empty input yields empty bytecode.
fn parse_bytecode(hex: &str) -> Result<Bytes, String> {
    if hex.contains("__") {
        return Err("bytecode has unresolved library links".to_string());
    }
    let hex = hex.trim();
    if hex.is_empty() || hex == "0x" {
        return Ok(Bytes::default());
    }
    Bytes::from_str(hex).map_err(|err| err.to_string())
}

/// A directory of compiled artifacts.
#[derive(Clone, Debug)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Loads the artifact for a contract name, looking for `<name>.json`
    /// directly under the root first and then anywhere in a
    /// `<File>.sol/<name>.json` layout.
    pub fn load(&self, name: &str) -> Result<Artifact, ArtifactError> {
        let (path, json) = self.read(name)?;
        let artifact = Artifact::from_json(&json, name).map_err(|source| ArtifactError::Json {
            path: path.clone(),
            source,
        })?;
        debug!(name, path = %path.display(), functions = artifact.functions.len(), "loaded artifact");
        Ok(artifact)
    }

    /// Loads an artifact and checks that it carries creation bytecode.
    pub fn load_deployable(&self, name: &str) -> Result<Artifact, ArtifactError> {
        let (path, json) = self.read(name)?;
        let raw: RawArtifact =
            serde_json::from_str(&json).map_err(|source| ArtifactError::Json {
                path: path.clone(),
                source,
            })?;
        parse_bytecode(raw.bytecode.hex()).map_err(|reason| ArtifactError::Bytecode {
            name: name.to_string(),
            reason,
        })?;

        let artifact =
            Artifact::from_json(&json, name).map_err(|source| ArtifactError::Json { path, source })?;
        if !artifact.is_deployable() {
            return Err(ArtifactError::NotDeployable {
                name: name.to_string(),
            });
        }
        Ok(artifact)
    }

    fn read(&self, name: &str) -> Result<(PathBuf, String), ArtifactError> {
        let path = self.find(name)?;
        match fs::read_to_string(&path) {
            Ok(json) => Ok((path, json)),
            Err(source) => Err(ArtifactError::Io { path, source }),
        }
    }

    fn find(&self, name: &str) -> Result<PathBuf, ArtifactError> {
        let file_name = format!("{name}.json");
        let flat = self.root.join(&file_name);
        if flat.is_file() {
            return Ok(flat);
        }

        let mut matches = Vec::new();
        find_nested(&self.root, &file_name, &mut matches);
        match matches.len() {
            0 => Err(ArtifactError::NotFound {
                name: name.to_string(),
                root: self.root.clone(),
            }),
            1 => Ok(matches.remove(0)),
            _ => {
                matches.sort();
                Err(ArtifactError::Ambiguous {
                    name: name.to_string(),
                    paths: matches,
                })
            }
        }
    }
}

/// Collects every `<anything>.sol/<file_name>` under `dir`. Symlinked
/// directories are not followed. Build-info and debug files never match
/// since they are not named after the contract.
fn find_nested(dir: &Path, file_name: &str, matches: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        // `file_type` does not follow symlinks.
        if !entry.file_type().is_ok_and(|kind| kind.is_dir()) {
            continue;
        }
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "sol") {
            let candidate = path.join(file_name);
            if candidate.is_file() {
                matches.push(candidate);
            }
        }
        find_nested(&path, file_name, matches);
    }
}
