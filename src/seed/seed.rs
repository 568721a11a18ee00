use std::path::{Path, PathBuf};

use hashlink::LinkedHashMap;
use saphyr::{LoadableYamlNode, Scalar, Yaml};
use snafu::prelude::*;
use tracing::{debug, info, warn};

use crate::namespace::{NamespaceTree, NodeId, TreeError};
use crate::session::is_addressable_name;

/// Builds a [`NamespaceTree`] from a YAML document.
///
/// Mappings become directories, scalars become files holding the scalar's
/// text and `null` becomes an empty file:
///
/// ```yaml
/// docs:
///   notes.txt: hello world
///   drafts: {}
/// todo.txt: ~
/// ```
pub struct Seed;

impl Seed {
    pub async fn load(path: &Path) -> Result<NamespaceTree, SeedError> {
        debug!("Reading seed file: {}", path.display());
        let bytes = compio::fs::read(path).await.context(ReadSnafu {
            file_path: path.to_path_buf(),
        })?;
        debug!("Successfully read seed file: {} bytes", bytes.len());

        let contents = String::from_utf8(bytes).context(EncodingSnafu {
            file_path: path.to_path_buf(),
        })?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<NamespaceTree, SeedError> {
        let documents = Yaml::load_from_str(contents).context(ParseSnafu)?;
        let document = documents.first().context(MalformedSeedSnafu)?;
        let top_level = document.as_mapping().context(TopLevelNotMapSnafu)?;

        let mut tree = NamespaceTree::new();
        let root = tree.root();
        let created = Self::populate(&mut tree, root, top_level)?;
        info!("Seeded tree with {} entries", created);

        Ok(tree)
    }

    fn populate(
        tree: &mut NamespaceTree,
        directory: NodeId,
        entries: &LinkedHashMap<Yaml, Yaml>,
    ) -> Result<usize, SeedError> {
        let mut created = 0;

        for (key, value) in entries {
            let Some(name) = key.as_str() else {
                warn!("Skipping seed entry with a non-string name: {:?}", key);
                continue;
            };
            if !is_addressable_name(name) {
                warn!(
                    "Skipping seed entry '{}': the name cannot be typed as a command argument",
                    name
                );
                continue;
            }

            match value {
                Yaml::Mapping(children) => {
                    let child = tree
                        .make_container(directory, name)
                        .context(PopulateSnafu)?;
                    created += 1 + Self::populate(tree, child, children)?;
                }
                Yaml::Value(scalar) => {
                    tree.make_leaf(directory, name).context(PopulateSnafu)?;
                    tree.write_content(directory, name, Self::scalar_text(scalar))
                        .context(PopulateSnafu)?;
                    created += 1;
                }
                _ => {
                    warn!("Skipping seed entry '{}': unsupported value {:?}", name, value);
                }
            }
        }

        Ok(created)
    }

    fn scalar_text(scalar: &Scalar) -> String {
        match scalar {
            Scalar::Null => String::new(),
            Scalar::Boolean(value) => value.to_string(),
            Scalar::Integer(value) => value.to_string(),
            Scalar::FloatingPoint(value) => value.to_string(),
            Scalar::String(value) => value.to_string(),
        }
    }
}

#[derive(Debug, Snafu)]
pub enum SeedError {
    #[snafu(display("Failed to read the seed file: {}", file_path.display()))]
    ReadError {
        file_path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Seed file {} is not valid UTF-8", file_path.display()))]
    EncodingError {
        file_path: PathBuf,
        source: std::string::FromUtf8Error,
    },
    #[snafu(display("Failed to parse the seed file"))]
    ParseError { source: saphyr::ScanError },
    #[snafu(display("Improperly formatted seed file"))]
    MalformedSeedError,
    #[snafu(display("Top level of the seed file should be a map"))]
    TopLevelNotMapError,
    #[snafu(display("Failed to populate the tree from the seed file"))]
    PopulateError { source: TreeError },
}
