use crate::error::{Result, SiloError};
use crate::storage::traits::{ContentStore, Store, StoreStats};
use crate::types::{Link, LinkId, Member, Node, NodeId, Silo, SiloId};
use chrono::Utc;
use redb::{Database, MultimapTableDefinition, ReadableMultimapTable, ReadableTable, TableDefinition};
use std::path::{Path, PathBuf};
use std::sync::Arc;

// Table definitions
const NODES: TableDefinition<u64, &[u8]> = TableDefinition::new("nodes");
const SILOS: TableDefinition<&[u8; 16], &[u8]> = TableDefinition::new("silos");
const LINKS: TableDefinition<&[u8; 16], &[u8]> = TableDefinition::new("links");

// Secondary index
const LINKS_BY_SOURCE: MultimapTableDefinition<u64, &[u8; 16]> =
    MultimapTableDefinition::new("links_by_source");

// Exclusion lists
const EXCLUDED_TARGETS: TableDefinition<u64, u8> = TableDefinition::new("excluded_targets");
const EXCLUDED_ANCHORS: TableDefinition<&str, u8> = TableDefinition::new("excluded_anchors");

// Metadata table
const META: TableDefinition<&str, &[u8]> = TableDefinition::new("meta");

/// Current schema version.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;
const SCHEMA_VERSION_KEY: &str = "schema_version";

/// Redb-based Store and ContentStore in a single file
pub struct RedbStore {
    db: Arc<Database>,
    path: PathBuf,
}

impl RedbStore {
    /// Open or create a database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SiloError::Validation(format!("Failed to create directory: {}", e))
            })?;
        }

        let is_new = !path.exists();
        let db = Database::create(&path)?;

        if !is_new {
            Self::check_schema_version(&db)?;
        }

        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(NODES)?;
            let _ = write_txn.open_table(SILOS)?;
            let _ = write_txn.open_table(LINKS)?;
            let _ = write_txn.open_multimap_table(LINKS_BY_SOURCE)?;
            let _ = write_txn.open_table(EXCLUDED_TARGETS)?;
            let _ = write_txn.open_table(EXCLUDED_ANCHORS)?;
            let mut meta = write_txn.open_table(META)?;
            if is_new {
                meta.insert(SCHEMA_VERSION_KEY, CURRENT_SCHEMA_VERSION.to_string().as_bytes())?;
            }
        }
        write_txn.commit()?;

        Ok(Self {
            db: Arc::new(db),
            path,
        })
    }

    /// Check schema version. Returns error on mismatch.
    fn check_schema_version(db: &Database) -> Result<()> {
        let read_txn = db.begin_read()?;
        let version = {
            let table = read_txn.open_table(META).ok();
            table
                .and_then(|t| {
                    t.get(SCHEMA_VERSION_KEY).ok().flatten().and_then(|v| {
                        std::str::from_utf8(v.value())
                            .ok()
                            .and_then(|s| s.parse::<u32>().ok())
                    })
                })
                .unwrap_or(CURRENT_SCHEMA_VERSION)
        };

        if version == CURRENT_SCHEMA_VERSION {
            Ok(())
        } else {
            Err(SiloError::Validation(format!(
                "Database schema v{} does not match this binary (v{})",
                version, CURRENT_SCHEMA_VERSION
            )))
        }
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn uuid_to_bytes(id: &uuid::Uuid) -> [u8; 16] {
        *id.as_bytes()
    }

    fn serialize_link(link: &Link) -> Result<Vec<u8>> {
        bincode::serialize(link).map_err(SiloError::from)
    }

    fn deserialize_link(bytes: &[u8]) -> Result<Link> {
        bincode::deserialize(bytes).map_err(SiloError::from)
    }

    fn deserialize_node(bytes: &[u8]) -> Result<Node> {
        bincode::deserialize(bytes).map_err(SiloError::from)
    }

    // Silo settings are loosely typed (untagged enums), so silos are stored
    // in a self-describing format.
    fn deserialize_silo(bytes: &[u8]) -> Result<Silo> {
        serde_json::from_slice(bytes).map_err(SiloError::from)
    }

    fn normalize_anchor(text: &str) -> String {
        crate::text::collapse_whitespace(text).to_lowercase()
    }

    /// Store a node (insert or update)
    pub fn put_node(&self, node: &Node) -> Result<()> {
        node.validate().map_err(SiloError::Validation)?;

        let bytes = bincode::serialize(node)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(NODES)?;
            table.insert(node.id, bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Store a silo (insert or update)
    pub fn put_silo(&self, silo: &Silo) -> Result<()> {
        silo.validate().map_err(SiloError::Validation)?;

        let bytes = serde_json::to_vec(silo)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(SILOS)?;
            table.insert(&Self::uuid_to_bytes(&silo.id), bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn exclude_target(&self, node_id: NodeId) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(EXCLUDED_TARGETS)?;
            table.insert(node_id, 1u8)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn exclude_anchor(&self, text: &str) -> Result<()> {
        let key = Self::normalize_anchor(text);
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(EXCLUDED_ANCHORS)?;
            table.insert(key.as_str(), 1u8)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Every link, whatever its status
    pub fn list_links(&self) -> Result<Vec<Link>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(LINKS)?;
        let mut links = Vec::new();
        for item in table.iter()? {
            let (_, value) = item?;
            links.push(Self::deserialize_link(value.value())?);
        }
        links.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(links)
    }

    /// Links from a node in any status
    fn links_by_source(&self, node_id: NodeId) -> Result<Vec<Link>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_multimap_table(LINKS_BY_SOURCE)?;
        let links_table = read_txn.open_table(LINKS)?;

        let mut links = Vec::new();
        for entry in index.get(node_id)? {
            let id_bytes = *entry?.value();
            if let Some(bytes) = links_table.get(&id_bytes)? {
                links.push(Self::deserialize_link(bytes.value())?);
            }
        }
        links.sort_by_key(|l| (l.position, l.created_at));
        Ok(links)
    }

    fn write_link(&self, link: &Link) -> Result<()> {
        let bytes = Self::serialize_link(link)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(LINKS)?;
            table.insert(&Self::uuid_to_bytes(&link.id), bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<StoreStats> {
        let read_txn = self.db.begin_read()?;
        let mut stats = StoreStats {
            node_count: read_txn.open_table(NODES)?.iter()?.count() as u64,
            silo_count: read_txn.open_table(SILOS)?.iter()?.count() as u64,
            excluded_targets: read_txn.open_table(EXCLUDED_TARGETS)?.iter()?.count() as u64,
            excluded_anchors: read_txn.open_table(EXCLUDED_ANCHORS)?.iter()?.count() as u64,
            ..StoreStats::default()
        };

        let links = read_txn.open_table(LINKS)?;
        for item in links.iter()? {
            let (_, value) = item?;
            if Self::deserialize_link(value.value())?.is_active() {
                stats.active_links += 1;
            } else {
                stats.removed_links += 1;
            }
        }

        Ok(stats)
    }
}

impl Store for RedbStore {
    fn get_silo(&self, id: SiloId) -> Result<Option<Silo>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SILOS)?;
        match table.get(&Self::uuid_to_bytes(&id))? {
            Some(bytes) => Ok(Some(Self::deserialize_silo(bytes.value())?)),
            None => Ok(None),
        }
    }

    fn list_silos(&self) -> Result<Vec<Silo>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SILOS)?;
        let mut silos = Vec::new();
        for item in table.iter()? {
            let (_, value) = item?;
            silos.push(Self::deserialize_silo(value.value())?);
        }
        silos.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(silos)
    }

    fn get_members(&self, silo_id: SiloId) -> Result<Vec<Member>> {
        let silo = self
            .get_silo(silo_id)?
            .ok_or(SiloError::SiloNotFound(silo_id))?;
        let mut members = silo.members;
        members.sort_by_key(|m| m.position);
        Ok(members)
    }

    fn create_link(&self, link: &Link) -> Result<()> {
        link.validate()
            .map_err(|reason| SiloError::InvalidLink { reason })?;

        let source = link.source;
        let id_bytes = Self::uuid_to_bytes(&link.id);
        let bytes = Self::serialize_link(link)?;

        // Single write transaction: duplicate check and insert are atomic
        let write_txn = self.db.begin_write()?;
        {
            let mut index = write_txn.open_multimap_table(LINKS_BY_SOURCE)?;
            let mut links_table = write_txn.open_table(LINKS)?;

            let existing: Vec<[u8; 16]> = index
                .get(source)?
                .map(|entry| entry.map(|guard| *guard.value()))
                .collect::<std::result::Result<Vec<_>, _>>()?;

            for other_id in existing {
                let other = match links_table.get(&other_id)? {
                    Some(guard) => Self::deserialize_link(guard.value())?,
                    None => continue,
                };
                if other.is_active() && other.silo_id == link.silo_id && other.target == link.target {
                    return Err(SiloError::DuplicateLink {
                        silo: link.silo_id,
                        source_id: link.source,
                        target_id: link.target,
                    });
                }
            }

            links_table.insert(&id_bytes, bytes.as_slice())?;
            index.insert(source, &id_bytes)?;
        }
        write_txn.commit()?;

        Ok(())
    }

    fn get_link(&self, id: LinkId) -> Result<Option<Link>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(LINKS)?;
        match table.get(&Self::uuid_to_bytes(&id))? {
            Some(bytes) => Ok(Some(Self::deserialize_link(bytes.value())?)),
            None => Ok(None),
        }
    }

    fn delete_link(&self, id: LinkId) -> Result<()> {
        let link = self.get_link(id)?.ok_or(SiloError::LinkNotFound(id))?;
        let id_bytes = Self::uuid_to_bytes(&id);

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(LINKS)?;
            table.remove(&id_bytes)?;
            let mut index = write_txn.open_multimap_table(LINKS_BY_SOURCE)?;
            index.remove(link.source, &id_bytes)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn get_links_from(&self, node_id: NodeId, silo_id: Option<SiloId>) -> Result<Vec<Link>> {
        Ok(self
            .links_by_source(node_id)?
            .into_iter()
            .filter(|l| l.is_active())
            .filter(|l| silo_id.map_or(true, |s| l.silo_id == s))
            .collect())
    }

    fn mark_removed(&self, node_id: NodeId, silo_id: Option<SiloId>) -> Result<u64> {
        let mut changed = 0;
        for mut link in self.get_links_from(node_id, silo_id)? {
            link.mark_removed();
            self.write_link(&link)?;
            changed += 1;
        }
        Ok(changed)
    }

    fn is_excluded_target(&self, node_id: NodeId) -> Result<bool> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(EXCLUDED_TARGETS)?;
        Ok(table.get(node_id)?.is_some())
    }

    fn is_excluded_anchor(&self, text: &str) -> Result<bool> {
        let key = Self::normalize_anchor(text);
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(EXCLUDED_ANCHORS)?;
        Ok(table.get(key.as_str())?.is_some())
    }

    fn anchor_usage_count(&self, text: &str) -> Result<u64> {
        let key = Self::normalize_anchor(text);
        Ok(self
            .list_links()?
            .iter()
            .filter(|l| l.is_active() && Self::normalize_anchor(&l.anchor_text) == key)
            .count() as u64)
    }
}

impl ContentStore for RedbStore {
    fn get_node(&self, id: NodeId) -> Result<Option<Node>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(NODES)?;
        match table.get(id)? {
            Some(bytes) => Ok(Some(Self::deserialize_node(bytes.value())?)),
            None => Ok(None),
        }
    }

    fn set_body(&self, id: NodeId, body: &str) -> Result<()> {
        let mut node = self.get_node(id)?.ok_or(SiloError::NodeNotFound(id))?;
        node.body = body.to_string();
        node.updated_at = Utc::now();
        self.put_node(&node)
    }
}
