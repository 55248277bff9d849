//! The ingestion engine
//!
//! Each jurisdiction's committed shard sits behind its own cell: an async
//! writer mutex serializes pipeline runs, and an async read/write lock guards
//! the `Arc<Shard>` readers see. A run clones the committed shard, stages
//! every record into the clone, links it, and commits by swapping the `Arc`.
//! Nothing a run does is visible until that swap, so a cancelled or
//! timed-out run leaves the last committed state untouched.

use crate::config::IngestConfig;
use crate::error::IngestError;
use crate::normalize::normalize;
use crate::types::{DriftNotice, IngestReport, RecordOutcome, RecordStatus};
use carton_domain::{
    resolve_floor_against, AuthorityCatalog, CandidateSource, Citation, DecisionNode, FloorViolation,
    Issue, IssueCode, Jurisdiction, NodeFamily, NodeKey, Relation,
};
use carton_gatekeeper::SchemaValidator;
use carton_linker::{LeafLinker, LinkReport};
use carton_store::{
    CitationClass, DecisionGraph, HeldConflict, InvariantViolation, ProvenanceStore, Shard, Snapshot, StoreError,
};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Cooperative cancellation for a running batch
///
/// Jurisdictions that have not committed when the token fires drop their
/// staged changes.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a token that has not fired
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the token
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether the token has fired
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

struct ShardCell {
    writer: tokio::sync::Mutex<()>,
    committed: tokio::sync::RwLock<Arc<Shard>>,
}

impl ShardCell {
    fn new(shard: Shard) -> Self {
        Self {
            writer: tokio::sync::Mutex::new(()),
            committed: tokio::sync::RwLock::new(Arc::new(shard)),
        }
    }
}

struct Inner {
    validator: SchemaValidator,
    catalog: AuthorityCatalog,
    config: IngestConfig,
    linker: LeafLinker,
    shards: RwLock<BTreeMap<Jurisdiction, Arc<ShardCell>>>,
    provenance: Mutex<Ledger>,
}

/// Committed provenance, plus the citation texts claimed by records that
/// are staged but not yet committed
///
/// Claims make the conflict check and the reservation one step under the
/// same lock, so two jurisdictions staging in parallel cannot both bind one
/// citation text to different URLs.
#[derive(Default)]
struct Ledger {
    committed: ProvenanceStore,
    claims: BTreeMap<String, Claim>,
}

struct Claim {
    url: Option<String>,
    /// Claiming records, as (jurisdiction, batch index)
    owners: BTreeSet<(Jurisdiction, usize)>,
}

impl Ledger {
    fn new(committed: ProvenanceStore) -> Self {
        Self {
            committed,
            claims: BTreeMap::new(),
        }
    }

    /// URL the citation's text is already bound to, when it differs
    ///
    /// Claims held by the same jurisdiction are skipped; its own staged
    /// provenance covers them.
    fn bound_elsewhere(&self, citation: &Citation, jurisdiction: &Jurisdiction) -> Option<Option<String>> {
        if let CitationClass::Conflict { existing_url } = self.committed.classify(citation) {
            return Some(existing_url);
        }
        self.claims
            .get(&citation.text)
            .filter(|c| c.url != citation.source_url && c.owners.iter().any(|(j, _)| j != jurisdiction))
            .map(|c| c.url.clone())
    }

    fn claim(&mut self, citations: &[Citation], owner: (Jurisdiction, usize)) {
        for citation in citations {
            self.claims
                .entry(citation.text.clone())
                .or_insert_with(|| Claim {
                    url: citation.source_url.clone(),
                    owners: BTreeSet::new(),
                })
                .owners
                .insert(owner.clone());
        }
    }

    fn release(&mut self, keep: impl Fn(&(Jurisdiction, usize)) -> bool) {
        self.claims.retain(|_, claim| {
            claim.owners.retain(|owner| keep(owner));
            !claim.owners.is_empty()
        });
    }
}

fn poisoned<T>(e: PoisonError<T>) -> IngestError {
    IngestError::Lock(e.to_string())
}

impl Inner {
    /// Cell for a jurisdiction, created empty on first use
    fn cell(&self, jurisdiction: &Jurisdiction) -> Result<Arc<ShardCell>, IngestError> {
        if let Some(cell) = self.shards.read().map_err(poisoned)?.get(jurisdiction) {
            return Ok(Arc::clone(cell));
        }
        let mut shards = self.shards.write().map_err(poisoned)?;
        let cell = shards
            .entry(jurisdiction.clone())
            .or_insert_with(|| Arc::new(ShardCell::new(Shard::new(jurisdiction.clone()))));
        Ok(Arc::clone(cell))
    }

    fn cells(&self) -> Result<Vec<(Jurisdiction, Arc<ShardCell>)>, IngestError> {
        Ok(self
            .shards
            .read()
            .map_err(poisoned)?
            .iter()
            .map(|(j, cell)| (j.clone(), Arc::clone(cell)))
            .collect())
    }

    async fn committed(&self, jurisdiction: &Jurisdiction) -> Result<Arc<Shard>, IngestError> {
        let cell = self.cell(jurisdiction)?;
        let shard = Arc::clone(&*cell.committed.read().await);
        Ok(shard)
    }
}

/// The decision-graph engine: validated ingestion plus read queries
///
/// Cloning is cheap; clones share the same graph.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<Inner>,
}

impl Engine {
    /// Create an engine over an empty graph
    pub fn new(validator: SchemaValidator, catalog: AuthorityCatalog, config: IngestConfig) -> Result<Self, IngestError> {
        Self::from_snapshot(
            Snapshot::new(DecisionGraph::new(), ProvenanceStore::new()),
            validator,
            catalog,
            config,
        )
    }

    /// Create an engine over a loaded snapshot
    pub fn from_snapshot(
        snapshot: Snapshot,
        validator: SchemaValidator,
        catalog: AuthorityCatalog,
        config: IngestConfig,
    ) -> Result<Self, IngestError> {
        config.validate().map_err(IngestError::Config)?;

        let shards: BTreeMap<Jurisdiction, Arc<ShardCell>> = snapshot
            .graph
            .shards()
            .map(|shard| (shard.jurisdiction().clone(), Arc::new(ShardCell::new(shard.clone()))))
            .collect();

        info!(
            "Engine ready: {} nodes, {} catalog entries",
            snapshot.graph.len(),
            catalog.len()
        );

        Ok(Self {
            inner: Arc::new(Inner {
                validator,
                catalog,
                config,
                linker: LeafLinker::new(),
                shards: RwLock::new(shards),
                provenance: Mutex::new(Ledger::new(snapshot.provenance)),
            }),
        })
    }

    /// Active configuration
    pub fn config(&self) -> &IngestConfig {
        &self.inner.config
    }

    /// Catalog the engine validates against
    pub fn catalog(&self) -> &AuthorityCatalog {
        &self.inner.catalog
    }

    /// Ingest a batch of raw candidate records
    pub async fn ingest(&self, candidates: Vec<Value>) -> Result<IngestReport, IngestError> {
        self.ingest_with_cancel(candidates, &CancelToken::new()).await
    }

    /// Ingest everything a candidate producer yields
    pub async fn ingest_from<S>(&self, source: &S) -> Result<IngestReport, IngestError>
    where
        S: CandidateSource,
        S::Error: Display,
    {
        let candidates = source
            .candidates()
            .map_err(|e| IngestError::Source(format!("{}: {}", source.name(), e)))?;
        info!("Source '{}' produced {} candidates", source.name(), candidates.len());
        self.ingest(candidates).await
    }

    /// Ingest a batch, checking `cancel` before each jurisdiction commits
    ///
    /// The FEDERAL group is staged and committed first so that state
    /// records validate and link against the updated baseline. State groups
    /// then run concurrently.
    pub async fn ingest_with_cancel(
        &self,
        candidates: Vec<Value>,
        cancel: &CancelToken,
    ) -> Result<IngestReport, IngestError> {
        let start = Instant::now();
        let max = self.inner.config.max_batch_size;
        if candidates.len() > max {
            return Err(IngestError::BatchTooLarge(candidates.len(), max));
        }

        info!("Starting ingestion batch of {} records", candidates.len());
        let mut report = IngestReport::new();

        let mut groups: BTreeMap<Jurisdiction, Vec<(usize, Value)>> = BTreeMap::new();
        for (index, raw) in candidates.into_iter().enumerate() {
            let record = match normalize(&raw) {
                Ok(record) => record,
                Err(issue) => {
                    debug!("Record {} failed normalization: {}", index, issue.message);
                    report.record(RecordOutcome::rejected(index, None, vec![issue]));
                    continue;
                }
            };
            match record_jurisdiction(&record) {
                Some(jurisdiction) => groups.entry(jurisdiction).or_default().push((index, record)),
                None => {
                    let mut issues = self.inner.validator.validate(&record, &self.inner.catalog).errors;
                    if issues.is_empty() {
                        issues.push(Issue::error(
                            IssueCode::MalformedInput,
                            "$.jurisdiction",
                            "Record does not name a valid jurisdiction",
                        ));
                    }
                    report.record(RecordOutcome::rejected(index, None, issues));
                }
            }
        }

        if let Some(records) = groups.remove(&Jurisdiction::federal()) {
            let (part, changed) =
                run_jurisdiction(Arc::clone(&self.inner), Jurisdiction::federal(), records, cancel.clone()).await?;
            report.absorb(part);

            if changed && self.inner.config.relink_on_baseline_change {
                let in_batch: BTreeSet<Jurisdiction> = groups.keys().cloned().collect();
                let links = self.relink_states(&in_batch).await?;
                report.links.merge(links);
            }
        }

        let semaphore = Arc::new(Semaphore::new(self.inner.config.max_concurrent_jurisdictions));
        let mut tasks = JoinSet::new();
        for (jurisdiction, records) in groups {
            let inner = Arc::clone(&self.inner);
            let cancel = cancel.clone();
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| IngestError::Task(e.to_string()))?;
                run_jurisdiction(inner, jurisdiction, records, cancel).await
            });
        }
        while let Some(joined) = tasks.join_next().await {
            let (part, _) = joined??;
            report.absorb(part);
        }

        report.sort();
        report.processing_time_ms = start.elapsed().as_millis() as u64;
        info!("Batch {} complete: {}", report.batch_id, report.summary());
        Ok(report)
    }

    /// Re-resolve the edges of every state not in the current batch
    async fn relink_states(&self, skip: &BTreeSet<Jurisdiction>) -> Result<LinkReport, IngestError> {
        let baseline = self.inner.committed(&Jurisdiction::federal()).await?;
        let mut links = LinkReport::new();

        for (jurisdiction, cell) in self.inner.cells()? {
            if jurisdiction.is_federal() || skip.contains(&jurisdiction) {
                continue;
            }
            let _writer = cell.writer.lock().await;
            let current = Arc::clone(&*cell.committed.read().await);
            if current.is_empty() {
                continue;
            }

            let mut staged = (*current).clone();
            let outcome = self.inner.linker.link_shard(&staged, &baseline);
            let mut changed = false;
            for (key, edges) in outcome.resolved {
                changed |= staged.relink(&key, edges)?;
            }
            links.merge(outcome.report);

            if changed {
                *cell.committed.write().await = Arc::new(staged);
                info!("Relinked {} after baseline change", jurisdiction);
            }
        }
        Ok(links)
    }

    /// Live version of a node
    pub async fn get_node(&self, key: &NodeKey) -> Result<Option<DecisionNode>, IngestError> {
        let shard = self.inner.committed(&key.jurisdiction).await?;
        Ok(shard.get(key).cloned())
    }

    /// Live version of a node, by its parts
    pub async fn get(
        &self,
        jurisdiction: &Jurisdiction,
        family: NodeFamily,
        sequence: u32,
    ) -> Result<Option<DecisionNode>, IngestError> {
        self.get_node(&NodeKey::new(jurisdiction.clone(), family, sequence)).await
    }

    /// Point-in-time copy of the committed graph
    pub async fn graph(&self) -> Result<DecisionGraph, IngestError> {
        let mut graph = DecisionGraph::new();
        for (_, cell) in self.inner.cells()? {
            let shard = Arc::clone(&*cell.committed.read().await);
            if !shard.is_empty() {
                graph.put_shard((*shard).clone());
            }
        }
        Ok(graph)
    }

    /// Copy of the provenance store
    pub fn provenance(&self) -> Result<ProvenanceStore, IngestError> {
        Ok(self.inner.provenance.lock().map_err(poisoned)?.committed.clone())
    }

    /// Nodes reachable from `start` along one relation, with their depth
    pub async fn traverse(
        &self,
        start: &NodeKey,
        relation: Relation,
        max_depth: usize,
    ) -> Result<Vec<(NodeKey, usize)>, IngestError> {
        let graph = self.graph().await?;
        Ok(graph.traverse(start, relation, max_depth).collect())
    }

    /// Symmetry and orphan-failure violations across the committed graph
    pub async fn check_consistency(&self) -> Result<Vec<InvariantViolation>, IngestError> {
        Ok(self.graph().await?.check_consistency())
    }

    /// Floor violations of a jurisdiction's nodes against their baseline slots
    pub async fn diff_against_federal(
        &self,
        jurisdiction: &Jurisdiction,
    ) -> Result<BTreeMap<NodeKey, Vec<FloorViolation>>, IngestError> {
        Ok(self.graph().await?.diff_against_federal(jurisdiction, &self.inner.catalog))
    }

    /// Snapshot of the committed graph and provenance
    pub async fn snapshot(&self) -> Result<Snapshot, IngestError> {
        let graph = self.graph().await?;
        Ok(Snapshot::new(graph, self.provenance()?))
    }
}

fn record_jurisdiction(record: &Value) -> Option<Jurisdiction> {
    record
        .get("jurisdiction")
        .and_then(Value::as_str)
        .and_then(|s| Jurisdiction::new(s).ok())
}

/// Stage and commit one jurisdiction under the configured time limit
async fn run_jurisdiction(
    inner: Arc<Inner>,
    jurisdiction: Jurisdiction,
    records: Vec<(usize, Value)>,
    cancel: CancelToken,
) -> Result<(IngestReport, bool), IngestError> {
    let limit = inner.config.jurisdiction_timeout();
    let result = match timeout(limit, stage_jurisdiction(&inner, &jurisdiction, records, &cancel)).await {
        Ok(result) => result,
        Err(_) => {
            warn!("{} did not commit within {:?}; staged changes dropped", jurisdiction, limit);
            let mut report = IngestReport::new();
            report.cancelled.push(jurisdiction.clone());
            Ok((report, false))
        }
    };
    // Committed claims now live in the committed store; dropped ones are void
    inner
        .provenance
        .lock()
        .map_err(poisoned)?
        .release(|(j, _)| j != &jurisdiction);
    result
}

/// Returns the jurisdiction's report and whether its shard changed
async fn stage_jurisdiction(
    inner: &Inner,
    jurisdiction: &Jurisdiction,
    records: Vec<(usize, Value)>,
    cancel: &CancelToken,
) -> Result<(IngestReport, bool), IngestError> {
    let mut report = IngestReport::new();
    if cancel.is_cancelled() {
        report.cancelled.push(jurisdiction.clone());
        return Ok((report, false));
    }

    let cell = inner.cell(jurisdiction)?;
    let _writer = cell.writer.lock().await;
    let current = Arc::clone(&*cell.committed.read().await);
    let baseline = if jurisdiction.is_federal() {
        None
    } else {
        Some(inner.committed(&Jurisdiction::federal()).await?)
    };

    debug!("Staging {} records for {}", records.len(), jurisdiction);
    let mut stage = Stage {
        inner,
        jurisdiction,
        shard: (*current).clone(),
        baseline,
        provenance: ProvenanceStore::new(),
        nodes_changed: false,
        provenance_changed: false,
        drift: Vec::new(),
    };

    let mut outcomes = Vec::with_capacity(records.len());
    for (index, record) in &records {
        outcomes.push(stage.record(*index, record)?);
    }

    let baseline_shard = stage.baseline.as_deref().unwrap_or(&stage.shard);
    let linked = inner.linker.link_shard(&stage.shard, baseline_shard);
    attach_link_issues(&mut outcomes, &linked.report);
    for (key, edges) in linked.resolved {
        if stage.shard.relink(&key, edges)? {
            stage.nodes_changed = true;
        }
    }

    if cancel.is_cancelled() {
        warn!("Batch cancelled; dropping staged changes for {}", jurisdiction);
        report.cancelled.push(jurisdiction.clone());
        return Ok((report, false));
    }

    let Stage {
        shard,
        provenance,
        nodes_changed,
        provenance_changed,
        drift,
        ..
    } = stage;

    report.links = linked.report;
    report.drift = drift;
    for outcome in outcomes {
        report.record(outcome);
    }

    if nodes_changed || provenance_changed {
        let mut committed = cell.committed.write().await;
        inner.provenance.lock().map_err(poisoned)?.committed.merge(provenance);
        if nodes_changed {
            info!(
                "Committed {}: {} nodes, {} versions",
                jurisdiction,
                shard.len(),
                shard.version_count()
            );
            *committed = Arc::new(shard);
        }
    } else {
        debug!("Nothing to commit for {}", jurisdiction);
    }

    Ok((report, nodes_changed))
}

/// Dangling edges become warnings on the records that carry them
fn attach_link_issues(outcomes: &mut [RecordOutcome], links: &LinkReport) {
    for outcome in outcomes.iter_mut() {
        if !matches!(outcome.status, RecordStatus::Committed | RecordStatus::Unchanged) {
            continue;
        }
        let Some(key) = &outcome.key else {
            continue;
        };
        for edge in links.dangling.iter().filter(|e| &e.node == key) {
            outcome.issues.push(Issue::warning(
                IssueCode::DanglingReference,
                format!("$.cross_references.{}", edge.relation),
                format!("{}: target does not exist, edge not installed", edge),
            ));
        }
    }
}

/// One jurisdiction's run in progress
struct Stage<'a> {
    inner: &'a Inner,
    jurisdiction: &'a Jurisdiction,
    shard: Shard,
    /// Committed FEDERAL shard; `None` while staging FEDERAL itself
    baseline: Option<Arc<Shard>>,
    provenance: ProvenanceStore,
    nodes_changed: bool,
    provenance_changed: bool,
    drift: Vec<DriftNotice>,
}

impl Stage<'_> {
    /// Classify one record, staging it when it is admitted
    ///
    /// Drift is tracked only for records that end up committed or
    /// unchanged, so a rejected or held record leaves provenance untouched.
    fn record(&mut self, index: usize, record: &Value) -> Result<RecordOutcome, IngestError> {
        let mut outcome = self.admit(index, record)?;

        if !matches!(outcome.status, RecordStatus::Committed) {
            let jurisdiction = self.jurisdiction;
            self.inner
                .provenance
                .lock()
                .map_err(poisoned)?
                .release(|owner| owner != &(jurisdiction.clone(), index));
        }

        if self.inner.config.detect_source_drift
            && matches!(outcome.status, RecordStatus::Committed | RecordStatus::Unchanged)
        {
            if let Some(key) = outcome.key.clone() {
                let drifted = self.track_drift(record, &key)?;
                outcome.issues.extend(drifted);
            }
        }
        Ok(outcome)
    }

    fn admit(&mut self, index: usize, record: &Value) -> Result<RecordOutcome, IngestError> {
        let checked = self.inner.validator.check(record, &self.inner.catalog);
        let key = checked.node.as_ref().map(DecisionNode::key);
        let mut node = match checked.node {
            Some(node) if checked.result.ok => node,
            _ => return Ok(RecordOutcome::rejected(index, key, checked.result.errors)),
        };
        let key = node.key();
        let mut issues = checked.result.errors;
        dedup_citations(&mut node.citations);

        let conflicts = self.claim_citations(index, &node)?;
        if !conflicts.is_empty() {
            for (i, conflict) in conflicts {
                issues.push(Issue::error(
                    IssueCode::CitationConflict,
                    format!("$.citations[{}]", i),
                    format!(
                        "{:?} is on record with source {} but this record cites {}",
                        conflict.text,
                        describe_url(&conflict.existing_url),
                        describe_url(&conflict.incoming_url),
                    ),
                ));
                self.provenance.hold_conflict(conflict);
            }
            self.provenance_changed = true;
            warn!("Holding {} on a citation conflict", key);
            return Ok(RecordOutcome {
                index,
                key: Some(key),
                status: RecordStatus::Held,
                version: None,
                issues,
            });
        }

        // The baseline is the floor; only state nodes are held to it
        let violations = match &self.baseline {
            None => Vec::new(),
            Some(baseline) => match baseline.get_slot(node.slot()) {
                Some(base) => resolve_floor_against(&node.layers, &base.layers, &self.inner.catalog).violations,
                None => {
                    issues.push(Issue::error(
                        IssueCode::MissingBaseline,
                        "$",
                        format!("No FEDERAL node at slot {} for {}", node.slot(), key),
                    ));
                    return Ok(RecordOutcome::rejected(index, Some(key), issues));
                }
            },
        };
        issues.extend(violations.iter().map(|v| {
            Issue::error(
                IssueCode::FloorViolation,
                format!("$.layers.{}", v.topic()),
                v.to_string(),
            )
        }));

        let threshold = self.inner.validator.config().threshold();
        if issues.iter().any(|i| i.severity >= threshold) {
            return Ok(RecordOutcome::rejected(index, Some(key), issues));
        }

        if let Some(live) = self.shard.get(&key) {
            if live.same_content(&node) {
                return Ok(RecordOutcome {
                    index,
                    key: Some(key),
                    status: RecordStatus::Unchanged,
                    version: Some(live.version),
                    issues,
                });
            }
        }

        let citations = node.citations.clone();
        match self.shard.add_node(node) {
            Ok(version) => {
                for citation in &citations {
                    self.provenance.record(citation, &key);
                }
                self.nodes_changed = true;
                self.provenance_changed = true;
                debug!("Staged {} v{}", key, version);
                Ok(RecordOutcome {
                    index,
                    key: Some(key),
                    status: RecordStatus::Committed,
                    version: Some(version),
                    issues,
                })
            }
            Err(e @ (StoreError::Duplicate(_) | StoreError::StaleSupersession { .. })) => {
                issues.push(Issue::error(IssueCode::DuplicateNode, "$.supersedes", e.to_string()));
                Ok(RecordOutcome::rejected(index, Some(key), issues))
            }
            Err(e) => {
                issues.push(Issue::error(IssueCode::MalformedInput, "$", e.to_string()));
                Ok(RecordOutcome::rejected(index, Some(key), issues))
            }
        }
    }

    /// Citations whose text is bound to another URL; claims the rest
    ///
    /// Checked against earlier citations of the same record, this run's
    /// staged provenance, the committed store and the claims of other
    /// jurisdictions, all under the ledger lock. A record with no conflict
    /// claims every citation text it carries until its run ends.
    fn claim_citations(&self, index: usize, node: &DecisionNode) -> Result<Vec<(usize, HeldConflict)>, IngestError> {
        let mut ledger = self.inner.provenance.lock().map_err(poisoned)?;
        let mut seen: BTreeMap<&str, &Option<String>> = BTreeMap::new();
        let mut out = Vec::new();

        for (i, citation) in node.citations.iter().enumerate() {
            let clash = match seen.get(citation.text.as_str()) {
                Some(url) if **url != citation.source_url => Some((*url).clone()),
                Some(_) => None,
                None => match self.provenance.classify(citation) {
                    CitationClass::Conflict { existing_url } => Some(existing_url),
                    CitationClass::Known => None,
                    CitationClass::New => ledger.bound_elsewhere(citation, self.jurisdiction),
                },
            };
            seen.entry(citation.text.as_str()).or_insert(&citation.source_url);

            if let Some(existing_url) = clash {
                out.push((
                    i,
                    HeldConflict {
                        text: citation.text.clone(),
                        existing_url,
                        incoming_url: citation.source_url.clone(),
                        node: node.key(),
                    },
                ));
            }
        }

        if out.is_empty() {
            ledger.claim(&node.citations, (self.jurisdiction.clone(), index));
        }
        Ok(out)
    }

    /// Record capture hashes; warn on pages whose content changed
    fn track_drift(&mut self, record: &Value, key: &NodeKey) -> Result<Vec<Issue>, IngestError> {
        let Some(captures) = record.get("captures").and_then(Value::as_array) else {
            return Ok(Vec::new());
        };

        let mut issues = Vec::new();
        for (i, capture) in captures.iter().enumerate() {
            let (Some(url), Some(hash)) = (
                capture.get("url").and_then(Value::as_str),
                capture.get("content_hash").and_then(Value::as_str),
            ) else {
                continue;
            };

            let previous = match self.provenance.content_hash_of(url) {
                Some(h) => Some(h.to_string()),
                None => self
                    .inner
                    .provenance
                    .lock()
                    .map_err(poisoned)?
                    .committed
                    .content_hash_of(url)
                    .map(str::to_string),
            };
            if previous.as_deref() == Some(hash) {
                continue;
            }
            self.provenance.check_drift(url, hash);
            self.provenance_changed = true;

            if let Some(previous) = previous {
                warn!("Source drift on {} for {}", url, key);
                issues.push(Issue::warning(
                    IssueCode::SourceDrift,
                    format!("$.captures[{}]", i),
                    format!("Content of {} changed since it was last captured", url),
                ));
                self.drift.push(DriftNotice {
                    url: url.to_string(),
                    previous_hash: previous,
                    current_hash: hash.to_string(),
                    node: key.clone(),
                });
            }
        }
        Ok(issues)
    }
}

/// Drop repeated `(text, source_url)` pairs, keeping the first
fn dedup_citations(citations: &mut Vec<Citation>) {
    let mut seen: BTreeSet<(String, Option<String>)> = BTreeSet::new();
    citations.retain(|c| seen.insert((c.text.clone(), c.source_url.clone())));
}

fn describe_url(url: &Option<String>) -> &str {
    url.as_deref().unwrap_or("(no URL)")
}
