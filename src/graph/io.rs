//! Loading and serializing the wordnet graph.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use oxigraph::io::RdfFormat;
use oxigraph::model::GraphNameRef;

use super::WordnetGraph;
use crate::error::{GraphError, GraphResult};

/// RDF syntax for a path, chosen by its extension.
pub fn rdf_format(path: &Path) -> GraphResult<RdfFormat> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("nt") => Ok(RdfFormat::NTriples),
        Some("ttl") => Ok(RdfFormat::Turtle),
        Some("rdf" | "xml" | "owl") => Ok(RdfFormat::RdfXml),
        Some("n3") => Ok(RdfFormat::N3),
        _ => Err(GraphError::UnsupportedFormat {
            path: path.display().to_string(),
        }),
    }
}

impl WordnetGraph {
    /// Load every triple of an RDF file into the default graph.
    ///
    /// Returns the number of new triples.
    pub fn load(&self, path: &Path) -> GraphResult<usize> {
        let format = rdf_format(path)?;
        let file = File::open(path).map_err(|e| GraphError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let before = self.len()?;
        self.store()
            .load_from_reader(format, BufReader::new(file))
            .map_err(|e| GraphError::Load {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        let loaded = self.len()? - before;
        tracing::info!(path = %path.display(), triples = loaded, "loaded graph");
        Ok(loaded)
    }

    /// Load RDF text in the given syntax.
    pub fn load_str(&self, format: RdfFormat, data: &str) -> GraphResult<()> {
        self.store()
            .load_from_reader(format, data.as_bytes())
            .map_err(|e| GraphError::Load {
                path: "<inline>".into(),
                message: e.to_string(),
            })
    }

    /// Serialize the default graph to a file, in the syntax its extension names.
    pub fn dump(&self, path: &Path) -> GraphResult<()> {
        let format = rdf_format(path)?;
        let file = File::create(path).map_err(|e| GraphError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let dump_error = |message: String| GraphError::Dump {
            path: path.display().to_string(),
            message,
        };
        let mut writer = self
            .store()
            .dump_graph_to_writer(GraphNameRef::DefaultGraph, format, BufWriter::new(file))
            .map_err(|e| dump_error(e.to_string()))?;
        writer.flush().map_err(|e| dump_error(e.to_string()))?;
        tracing::info!(path = %path.display(), triples = self.len()?, "serialized graph");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    const SAMPLE: &str = r#"
        <https://example.org/a> <https://example.org/p> "entidade"@pt .
        <https://example.org/a> <https://example.org/p> <https://example.org/b> .
    "#;

    #[test]
    fn format_from_extension() {
        assert_eq!(rdf_format(Path::new("own-pt.nt")).unwrap(), RdfFormat::NTriples);
        assert_eq!(rdf_format(Path::new("own-pt.TTL")).unwrap(), RdfFormat::Turtle);
        assert_eq!(rdf_format(Path::new("own-pt.owl")).unwrap(), RdfFormat::RdfXml);
        assert!(matches!(
            rdf_format(Path::new("own-pt.json")),
            Err(GraphError::UnsupportedFormat { .. })
        ));
        assert!(rdf_format(Path::new("own-pt")).is_err());
    }

    #[test]
    fn dump_then_load_preserves_triples() {
        let dir = TempDir::new().unwrap();
        let graph = WordnetGraph::new().unwrap();
        graph.load_str(RdfFormat::NTriples, SAMPLE).unwrap();

        for name in ["out.nt", "out.ttl", "out.rdf"] {
            let path = dir.path().join(name);
            graph.dump(&path).unwrap();
            let reloaded = WordnetGraph::new().unwrap();
            assert_eq!(reloaded.load(&path).unwrap(), 2, "{name}");
        }
    }

    #[test]
    fn load_reports_parse_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.nt");
        std::fs::write(&path, "this is not n-triples\n").unwrap();
        let graph = WordnetGraph::new().unwrap();
        assert!(matches!(graph.load(&path), Err(GraphError::Load { .. })));
    }
}
