//! Node resolution: expanding way references into fetched node records.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::{ResolveMode, ResolveOptions};
use crate::error::{FetcherError, Result};
use crate::types::{Element, Node, OsmJson};

/// List every node id referenced by the ways in `elements`.
///
/// References are flattened in way order then reference order. Duplicates
/// are kept, so each occurrence gets its own fetch. References that failed
/// integer coercion are dropped and never resolved.
pub fn referenced_node_ids(elements: &[Element]) -> Vec<i64> {
    elements
        .iter()
        .filter_map(Element::as_way)
        .flat_map(|way| way.node_ids())
        .collect()
}

/// Resolve the node references of every way in `collection`.
///
/// `fetch_node` performs one independent round trip per id. All fetches run
/// concurrently and the call waits for every one of them. Resolved nodes are
/// placed in reference order ahead of the original elements.
///
/// In [`ResolveMode::FailFast`] the first failure aborts the remaining
/// fetches and is returned; nothing partial is produced. In
/// [`ResolveMode::BestEffort`] failures are logged and skipped.
pub async fn resolve_nodes<F, Fut>(
    collection: OsmJson,
    options: &ResolveOptions,
    fetch_node: F,
) -> Result<OsmJson>
where
    F: Fn(i64) -> Fut,
    Fut: Future<Output = Result<Node>> + Send + 'static,
{
    let ids = referenced_node_ids(&collection.elements);
    if ids.is_empty() {
        return Ok(collection);
    }

    let started = Instant::now();
    let fan_out = fetch_all(&ids, options, fetch_node);
    let resolved = match options.deadline {
        Some(deadline) => tokio::time::timeout(deadline, fan_out)
            .await
            .map_err(|_| FetcherError::Timeout {
                elapsed_ms: started.elapsed().as_millis(),
            })??,
        None => fan_out.await?,
    };

    tracing::info!(
        requested = ids.len(),
        resolved = resolved.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Resolved way nodes"
    );

    let mut elements: Vec<Element> = resolved.into_iter().map(Element::Node).collect();
    elements.extend(collection.elements);
    Ok(OsmJson::new(elements))
}

/// Spawn one task per id and gather the results in id order.
///
/// Dropping the returned future (e.g. on timeout) drops the `JoinSet`,
/// which aborts every task still running.
async fn fetch_all<F, Fut>(
    ids: &[i64],
    options: &ResolveOptions,
    fetch_node: F,
) -> Result<Vec<Node>>
where
    F: Fn(i64) -> Fut,
    Fut: Future<Output = Result<Node>> + Send + 'static,
{
    let limit = options.max_concurrency.map(|n| Arc::new(Semaphore::new(n)));
    let mut tasks = JoinSet::new();

    for (index, &id) in ids.iter().enumerate() {
        let fetch = fetch_node(id);
        let limit = limit.clone();
        tasks.spawn(async move {
            // The semaphore is never closed, so acquiring only waits.
            let _permit = match limit {
                Some(semaphore) => semaphore.acquire_owned().await.ok(),
                None => None,
            };
            tracing::debug!(node_id = id, "Fetching node");
            fetch.await.map(|node| (index, node)).map_err(|e| (id, e))
        });
    }

    let mut slots: Vec<Option<Node>> = vec![None; ids.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined? {
            Ok((index, node)) => {
                if let Some(slot) = slots.get_mut(index) {
                    *slot = Some(node);
                }
            }
            Err((id, error)) => match options.mode {
                ResolveMode::FailFast => {
                    tracing::error!(
                        node_id = id,
                        error = %error,
                        "Node fetch failed, aborting resolution"
                    );
                    tasks.abort_all();
                    return Err(error);
                }
                ResolveMode::BestEffort => {
                    tracing::warn!(node_id = id, error = %error, "Node fetch failed, skipping");
                }
            },
        }
    }

    Ok(slots.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ElementInfo, ElementType, Way};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn way(id: i64, nodes: Vec<Option<i64>>) -> Element {
        Element::Way(Way {
            info: ElementInfo::with_id(id),
            nodes,
        })
    }

    fn node(id: i64) -> Node {
        Node {
            info: ElementInfo::with_id(id),
            lat: Some(id as f64 / 10.0),
            lon: Some(-(id as f64) / 10.0),
        }
    }

    fn ok_fetch(id: i64) -> impl Future<Output = Result<Node>> + Send + 'static {
        async move { Ok(node(id)) }
    }

    #[test]
    fn test_referenced_node_ids_keeps_duplicates_drops_invalid() {
        let elements = vec![
            way(1, vec![Some(10), None, Some(11), Some(10)]),
            Element::Node(node(99)),
            way(2, vec![Some(12)]),
        ];
        assert_eq!(referenced_node_ids(&elements), vec![10, 11, 10, 12]);
    }

    #[tokio::test]
    async fn test_resolve_prepends_nodes_in_reference_order() {
        let collection = OsmJson::new(vec![way(1, vec![Some(30), Some(10), Some(20)])]);

        // Later references finish first.
        let resolved = resolve_nodes(collection, &ResolveOptions::default(), |id| async move {
            tokio::time::sleep(Duration::from_millis(60 - id as u64)).await;
            Ok(node(id))
        })
        .await
        .unwrap();

        let order: Vec<(ElementType, i64)> = resolved
            .elements
            .iter()
            .map(|e| (e.element_type(), e.id()))
            .collect();
        assert_eq!(
            order,
            vec![
                (ElementType::Node, 30),
                (ElementType::Node, 10),
                (ElementType::Node, 20),
                (ElementType::Way, 1),
            ]
        );
    }

    #[tokio::test]
    async fn test_resolve_duplicates_fetch_twice() {
        let calls = Arc::new(AtomicUsize::new(0));
        let collection = OsmJson::new(vec![way(1, vec![Some(10), Some(10)])]);

        let counter = calls.clone();
        let resolved = resolve_nodes(collection, &ResolveOptions::default(), move |id| {
            counter.fetch_add(1, Ordering::SeqCst);
            ok_fetch(id)
        })
        .await
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(resolved.nodes().filter(|n| n.info.id == 10).count(), 2);
        assert_eq!(resolved.len(), 3);
    }

    #[tokio::test]
    async fn test_resolve_without_references_fetches_nothing() {
        let calls = Arc::new(AtomicUsize::new(0));
        let collection = OsmJson::new(vec![way(1, vec![None])]);

        let counter = calls.clone();
        let resolved = resolve_nodes(collection.clone(), &ResolveOptions::default(), move |id| {
            counter.fetch_add(1, Ordering::SeqCst);
            ok_fetch(id)
        })
        .await
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(resolved, collection);
    }

    #[tokio::test]
    async fn test_resolve_fail_fast() {
        let collection = OsmJson::new(vec![way(1, vec![Some(10), Some(11), Some(12)])]);

        let result = resolve_nodes(collection, &ResolveOptions::default(), |id| async move {
            if id == 11 {
                Err(FetcherError::HttpStatus {
                    status: 500,
                    url: format!("/node/{id}"),
                })
            } else {
                Ok(node(id))
            }
        })
        .await;

        assert!(matches!(
            result,
            Err(FetcherError::HttpStatus { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_fail_fast_aborts_pending_siblings() {
        let finished = Arc::new(AtomicUsize::new(0));
        let collection = OsmJson::new(vec![way(1, vec![Some(10), Some(11), Some(12)])]);

        let counter = finished.clone();
        let result = resolve_nodes(collection, &ResolveOptions::default(), move |id| {
            let counter = counter.clone();
            async move {
                if id == 11 {
                    return Err(FetcherError::HttpStatus {
                        status: 500,
                        url: format!("/node/{id}"),
                    });
                }
                tokio::time::sleep(Duration::from_millis(200)).await;
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(node(id))
            }
        })
        .await;

        assert!(result.is_err());
        // Give aborted siblings time to finish if they were still running.
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_deadline_cancels_outstanding_fetches() {
        let finished = Arc::new(AtomicUsize::new(0));
        let collection = OsmJson::new(vec![way(1, vec![Some(10), Some(11)])]);
        let options = ResolveOptions {
            deadline: Some(Duration::from_millis(50)),
            ..ResolveOptions::default()
        };

        let counter = finished.clone();
        let result = resolve_nodes(collection, &options, move |id| {
            let counter = counter.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(200)).await;
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(node(id))
            }
        })
        .await;

        assert!(matches!(result, Err(FetcherError::Timeout { .. })));
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_resolve_best_effort_skips_failures() {
        let collection = OsmJson::new(vec![way(1, vec![Some(10), Some(11), Some(12)])]);
        let options = ResolveOptions {
            mode: ResolveMode::BestEffort,
            ..ResolveOptions::default()
        };

        let resolved = resolve_nodes(collection, &options, |id| async move {
            if id == 11 {
                Err(FetcherError::ElementNotFound {
                    kind: ElementType::Node,
                    id,
                })
            } else {
                Ok(node(id))
            }
        })
        .await
        .unwrap();

        let node_ids: Vec<i64> = resolved.nodes().map(|n| n.info.id).collect();
        assert_eq!(node_ids, vec![10, 12]);
        assert_eq!(resolved.ways().count(), 1);
    }

    #[tokio::test]
    async fn test_resolve_deadline() {
        let collection = OsmJson::new(vec![way(1, vec![Some(10)])]);
        let options = ResolveOptions {
            deadline: Some(Duration::from_millis(20)),
            ..ResolveOptions::default()
        };

        let result = resolve_nodes(collection, &options, |id| async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(node(id))
        })
        .await;

        assert!(matches!(result, Err(FetcherError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_resolve_respects_concurrency_limit() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let collection = OsmJson::new(vec![way(1, (1..=8).map(Some).collect())]);
        let options = ResolveOptions {
            max_concurrency: Some(2),
            ..ResolveOptions::default()
        };

        let (current, max_seen) = (in_flight.clone(), peak.clone());
        let resolved = resolve_nodes(collection, &options, move |id| {
            let current = current.clone();
            let max_seen = max_seen.clone();
            async move {
                let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                current.fetch_sub(1, Ordering::SeqCst);
                Ok(node(id))
            }
        })
        .await
        .unwrap();

        assert_eq!(resolved.nodes().count(), 8);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }
}
