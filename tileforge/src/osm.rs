//! OSM PBF way source.
//!
//! Reads an extract in two passes: node positions are collected by id,
//! then every way is resolved against them and handed to a
//! [`SpatialIndexBuilder`].

use crate::coord::Point;
use crate::index::{IndexError, SpatialIndex, SpatialIndexBuilder, WayRecord};
use osmpbf::{Element, ElementReader};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A decoded way borrowing its tags from the PBF block.
struct PbfWay<'a> {
    points: Vec<Point>,
    tags: Vec<(&'a str, &'a str)>,
}

impl WayRecord for PbfWay<'_> {
    fn points(&self) -> &[Point] {
        &self.points
    }

    fn tag(&self, key: &str) -> Option<&str> {
        self.tags.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }
}

/// A PBF extract read as a sequence of ways.
#[derive(Debug, Clone)]
pub struct PbfWaySource {
    path: PathBuf,
}

impl PbfWaySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn reader(&self) -> Result<ElementReader<std::io::BufReader<std::fs::File>>, IndexError> {
        ElementReader::from_path(&self.path)
            .map_err(|e| IndexError::Source(format!("{}: {}", self.path.display(), e)))
    }

    /// Node id to position for every node in the extract.
    fn load_nodes(&self) -> Result<HashMap<i64, Point>, IndexError> {
        let mut nodes = HashMap::new();
        self.reader()?
            .for_each(|element| {
                let (id, lon, lat) = match element {
                    Element::Node(node) => (node.id(), node.lon(), node.lat()),
                    Element::DenseNode(node) => (node.id(), node.lon(), node.lat()),
                    _ => return,
                };
                nodes.insert(id, Point::new(lon, lat));
            })
            .map_err(|e| IndexError::Source(e.to_string()))?;
        Ok(nodes)
    }

    /// Feed every way of the extract into `builder` and finish it.
    pub fn build_index(&self, mut builder: SpatialIndexBuilder) -> Result<SpatialIndex, IndexError> {
        info!(path = %self.path.display(), "Loading OSM extract");
        let nodes = self.load_nodes()?;
        debug!(nodes = nodes.len(), "Node positions loaded");

        let mut failure: Option<IndexError> = None;
        let mut unresolved = 0u64;
        self.reader()?
            .for_each(|element| {
                if failure.is_some() {
                    return;
                }
                let Element::Way(way) = element else {
                    return;
                };

                let record = PbfWay {
                    points: resolve_refs(way.refs(), &nodes, &mut unresolved),
                    tags: way.tags().collect(),
                };

                if let Err(e) = builder.push_way(&record) {
                    failure = Some(e);
                }
            })
            .map_err(|e| IndexError::Source(e.to_string()))?;

        if let Some(e) = failure {
            return Err(e);
        }
        if unresolved > 0 {
            warn!(unresolved, "Way node references without a node position");
        }

        builder.finish()
    }
}

/// Positions of the referenced nodes, in order. References with no known
/// node are dropped and counted in `unresolved`.
fn resolve_refs(
    refs: impl Iterator<Item = i64>,
    nodes: &HashMap<i64, Point>,
    unresolved: &mut u64,
) -> Vec<Point> {
    let mut points = Vec::new();
    for id in refs {
        match nodes.get(&id) {
            Some(point) => points.push(*point),
            None => *unresolved += 1,
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_tag_lookup() {
        let way = PbfWay {
            points: vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)],
            tags: vec![("highway", "primary"), ("name", "High Street")],
        };

        assert_eq!(way.tag("highway"), Some("primary"));
        assert_eq!(way.tag("name"), Some("High Street"));
        assert_eq!(way.tag("building"), None);
        assert_eq!(way.points().len(), 2);
    }

    #[test]
    fn test_tag_lookup_returns_first_duplicate() {
        let way = PbfWay {
            points: Vec::new(),
            tags: vec![("name", "first"), ("name", "second")],
        };
        assert_eq!(way.tag("name"), Some("first"));
    }

    #[test]
    fn test_unresolved_refs_skipped() {
        let nodes = HashMap::from([(1, Point::new(10.0, 50.0)), (3, Point::new(11.0, 51.0))]);
        let mut unresolved = 0;

        let points = resolve_refs([1, 2, 3, 4].into_iter(), &nodes, &mut unresolved);

        assert_eq!(points, vec![Point::new(10.0, 50.0), Point::new(11.0, 51.0)]);
        assert_eq!(unresolved, 2);
    }

    #[test]
    fn test_unresolved_count_accumulates() {
        let nodes = HashMap::from([(7, Point::new(0.5, 0.5))]);
        let mut unresolved = 1;

        let points = resolve_refs([8, 9].into_iter(), &nodes, &mut unresolved);

        assert!(points.is_empty());
        assert_eq!(unresolved, 3);
    }

    #[test]
    fn test_missing_extract_is_source_error() {
        let dir = TempDir::new().unwrap();
        let source = PbfWaySource::new(dir.path().join("absent.osm.pbf"));
        let builder = SpatialIndexBuilder::create(&dir.path().join("ways.bin"), 12).unwrap();

        let err = source.build_index(builder).unwrap_err();
        assert!(matches!(err, IndexError::Source(ref msg) if msg.contains("absent.osm.pbf")));
    }
}
