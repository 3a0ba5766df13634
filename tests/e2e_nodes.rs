//! End-to-end tests for the node service: creation, validation, ownership,
//! the anchor rule, linking, and the entry points that wrap the kinship engine.

use chrono::NaiveDate;
use pretty_assertions::assert_eq;

use famtree::{
    AccountId, BackendConfig, DerivedRelation, Error, FamilyTree, Gender, LinkKind,
    MemoryBackend, NodeId, NodeRequest, NodeUpdate, RelationKind, StorageBackend, TxMode,
};

const ALICE: AccountId = AccountId(1);
const BOB: AccountId = AccountId(2);

// ============================================================================
// Helpers
// ============================================================================

fn fields(first: &str, last: &str) -> NodeUpdate {
    NodeUpdate::new(first, last)
        .born(NaiveDate::from_ymd_opt(1985, 3, 14).unwrap())
        .gender(Gender::Female)
}

async fn setup() -> FamilyTree<MemoryBackend> {
    FamilyTree::open(BackendConfig::Memory).await.unwrap()
}

// ============================================================================
// 1. Creation
// ============================================================================

#[tokio::test]
async fn test_create_node_stores_profile_and_owner() {
    let tree = setup().await;

    let node = tree
        .create_node(
            ALICE,
            NodeRequest::new(
                fields("Alice", "Martin")
                    .title("Mme")
                    .address("1 rue de la Paix")
                    .phone("+33 1 23 45 67 89")
                    .interests(["gardening", "chess"]),
            ),
        )
        .await
        .unwrap();

    assert_eq!(node.owner, ALICE);
    assert!(!node.anchor);
    assert_eq!(node.profile.title.as_deref(), Some("Mme"));
    assert_eq!(node.profile.interests, vec!["gardening".to_string(), "chess".to_string()]);
    assert_eq!(tree.node(node.id).await.unwrap(), node);
}

#[tokio::test]
async fn test_create_node_rejects_invalid_request() {
    let tree = setup().await;

    let missing_gender = NodeRequest::new(NodeUpdate::new("Alice", "Martin")
        .born(NaiveDate::from_ymd_opt(1985, 3, 14).unwrap()));
    let result = tree.create_node(ALICE, missing_gender).await;
    assert!(matches!(result, Err(Error::InvalidInput(_))));

    let blank_name = NodeRequest::new(fields(" ", "Martin"));
    let result = tree.create_node(ALICE, blank_name).await;
    assert!(matches!(result, Err(Error::InvalidInput(_))));

    assert!(tree.nodes().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_child_link() {
    let tree = setup().await;
    let mum = tree.create_node(ALICE, NodeRequest::new(fields("Mum", "Martin"))).await.unwrap();
    let kid = tree
        .create_node(ALICE, NodeRequest::new(fields("Kid", "Martin")).linked_to(mum.id, LinkKind::Child))
        .await
        .unwrap();

    let tx = tree.backend().begin_tx(TxMode::ReadOnly).await.unwrap();
    let k = tree.kinship(&tx);
    assert_eq!(k.direct_children(mum.id).await.unwrap(), vec![kid.id]);
}

#[tokio::test]
async fn test_create_parent_link_stored_as_child_link() {
    let tree = setup().await;
    let kid = tree.create_node(ALICE, NodeRequest::new(fields("Kid", "Martin"))).await.unwrap();
    let dad = tree
        .create_node(ALICE, NodeRequest::new(fields("Dad", "Martin")).linked_to(kid.id, LinkKind::Parent))
        .await
        .unwrap();

    let tx = tree.backend().begin_tx(TxMode::ReadOnly).await.unwrap();
    let child_links = tree.backend().relations_by_kind(&tx, RelationKind::Child).await.unwrap();
    assert_eq!(child_links.len(), 1);
    assert_eq!((child_links[0].src, child_links[0].dst), (dad.id, kid.id));
    assert_eq!(tree.kinship(&tx).direct_parents(kid.id).await.unwrap().as_slice(), &[dad.id]);
}

#[tokio::test]
async fn test_create_link_to_missing_node_fails() {
    let tree = setup().await;

    let result = tree
        .create_node(ALICE, NodeRequest::new(fields("Orphan", "Martin")).linked_to(NodeId(99), LinkKind::Child))
        .await;
    assert!(matches!(result, Err(Error::NotFound(_))));
    assert!(tree.nodes().await.unwrap().is_empty());
}

// ============================================================================
// 2. Anchor node rule
// ============================================================================

#[tokio::test]
async fn test_single_anchor_per_account() {
    let tree = setup().await;

    let me = tree.create_node(ALICE, NodeRequest::new(fields("Alice", "Martin")).anchor()).await.unwrap();
    assert!(me.anchor);

    let second = tree.create_node(ALICE, NodeRequest::new(fields("Other", "Martin")).anchor()).await;
    assert!(matches!(second, Err(Error::InvalidInput(_))));

    // Another account has its own anchor slot.
    let bob = tree.create_node(BOB, NodeRequest::new(fields("Bob", "Durand")).anchor()).await.unwrap();

    assert_eq!(tree.anchor_node(ALICE).await.unwrap(), me);
    assert_eq!(tree.anchor_node(BOB).await.unwrap(), bob);
}

#[tokio::test]
async fn test_missing_anchor_is_distinct_error() {
    let tree = setup().await;
    tree.create_node(ALICE, NodeRequest::new(fields("Not", "Me"))).await.unwrap();

    let result = tree.anchor_node(ALICE).await;
    assert!(matches!(result, Err(Error::AnchorNotFound(AccountId(1)))));

    let result = tree.anchor_family(ALICE).await;
    assert!(matches!(result, Err(Error::AnchorNotFound(_))));
}

#[tokio::test]
async fn test_duplicate_anchor_in_storage_is_reported() {
    let tree = setup().await;
    {
        let backend = tree.backend();
        let mut tx = backend.begin_tx(TxMode::ReadWrite).await.unwrap();
        for name in ["A", "B"] {
            let profile = fields(name, "Dup").validate().unwrap();
            backend.create_node(&mut tx, ALICE, true, profile).await.unwrap();
        }
        backend.commit_tx(tx).await.unwrap();
    }

    let result = tree.anchor_node(ALICE).await;
    assert!(matches!(result, Err(Error::ConstraintViolation(_))));
}

#[tokio::test]
async fn test_anchor_family() {
    let tree = setup().await;
    let me = tree.create_node(ALICE, NodeRequest::new(fields("Alice", "Martin")).anchor()).await.unwrap();
    let mum = tree
        .create_node(ALICE, NodeRequest::new(fields("Mum", "Martin")).linked_to(me.id, LinkKind::Parent))
        .await
        .unwrap();

    let family = tree.anchor_family(ALICE).await.unwrap();
    assert_eq!(family.sorted(), vec![DerivedRelation::child(mum.id, me.id)]);
}

// ============================================================================
// 3. Updates and ownership
// ============================================================================

#[tokio::test]
async fn test_update_node_by_owner() {
    let tree = setup().await;
    let node = tree.create_node(ALICE, NodeRequest::new(fields("Alice", "Martin")).anchor()).await.unwrap();

    let updated = tree
        .update_node(ALICE, node.id, fields("Alice", "Dupont").phone("0600000000"))
        .await
        .unwrap();

    assert_eq!(updated.id, node.id);
    assert_eq!(updated.profile.last_name, "Dupont");
    assert_eq!(updated.profile.phone.as_deref(), Some("0600000000"));
    assert!(updated.anchor, "updates never touch the anchor flag");
    assert_eq!(updated.owner, ALICE);
}

#[tokio::test]
async fn test_update_node_by_stranger_is_unauthorized() {
    let tree = setup().await;
    let node = tree.create_node(ALICE, NodeRequest::new(fields("Alice", "Martin"))).await.unwrap();

    let result = tree.update_node(BOB, node.id, fields("Mallory", "Martin")).await;
    assert!(matches!(result, Err(Error::Unauthorized(_))));
    assert_eq!(tree.node(node.id).await.unwrap().profile.first_name, "Alice");
}

#[tokio::test]
async fn test_update_missing_node_and_invalid_update() {
    let tree = setup().await;
    let node = tree.create_node(ALICE, NodeRequest::new(fields("Alice", "Martin"))).await.unwrap();

    let result = tree.update_node(ALICE, NodeId(500), fields("X", "Y")).await;
    assert!(matches!(result, Err(Error::NotFound(_))));

    let result = tree.update_node(ALICE, node.id, NodeUpdate::new("Alice", "")).await;
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

#[tokio::test]
async fn test_node_lookup_and_listing() {
    let tree = setup().await;
    let a = tree.create_node(ALICE, NodeRequest::new(fields("A", "Martin"))).await.unwrap();
    let b = tree.create_node(BOB, NodeRequest::new(fields("B", "Durand"))).await.unwrap();
    let c = tree.create_node(ALICE, NodeRequest::new(fields("C", "Martin"))).await.unwrap();

    let all: Vec<NodeId> = tree.nodes().await.unwrap().into_iter().map(|n| n.id).collect();
    assert_eq!(all, vec![a.id, b.id, c.id]);

    let alices: Vec<NodeId> = tree.nodes_owned_by(ALICE).await.unwrap().into_iter().map(|n| n.id).collect();
    assert_eq!(alices, vec![a.id, c.id]);

    assert!(matches!(tree.node(NodeId(42)).await, Err(Error::NotFound(_))));
}

// ============================================================================
// 4. Relating existing nodes
// ============================================================================

#[tokio::test]
async fn test_relate_requires_ownership_of_an_endpoint() {
    let tree = setup().await;
    let a = tree.create_node(ALICE, NodeRequest::new(fields("A", "Martin"))).await.unwrap();
    let b = tree.create_node(ALICE, NodeRequest::new(fields("B", "Martin"))).await.unwrap();
    let c = tree.create_node(BOB, NodeRequest::new(fields("C", "Durand"))).await.unwrap();

    let result = tree.relate(BOB, a.id, b.id, RelationKind::Spouse).await;
    assert!(matches!(result, Err(Error::Unauthorized(_))));

    // Bob owns one end of this one.
    let rel = tree.relate(BOB, c.id, a.id, RelationKind::Spouse).await.unwrap();
    assert_eq!((rel.src, rel.dst, rel.kind), (c.id, a.id, RelationKind::Spouse));
}

#[tokio::test]
async fn test_relate_rejects_self_and_missing_nodes() {
    let tree = setup().await;
    let a = tree.create_node(ALICE, NodeRequest::new(fields("A", "Martin"))).await.unwrap();

    let result = tree.relate(ALICE, a.id, a.id, RelationKind::Child).await;
    assert!(matches!(result, Err(Error::InvalidInput(_))));

    let result = tree.relate(ALICE, a.id, NodeId(77), RelationKind::Child).await;
    assert!(matches!(result, Err(Error::NotFound(_))));
}

// ============================================================================
// 5. Kinship entry points
// ============================================================================

#[tokio::test]
async fn test_family_relations_of_missing_node() {
    let tree = setup().await;
    let result = tree.family_relations(NodeId(1)).await;
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_family_graph_resolves_members() {
    let tree = setup().await;
    let me = tree.create_node(ALICE, NodeRequest::new(fields("Me", "Martin")).anchor()).await.unwrap();
    let mum = tree
        .create_node(ALICE, NodeRequest::new(fields("Mum", "Martin")).linked_to(me.id, LinkKind::Parent))
        .await
        .unwrap();
    let partner = tree
        .create_node(BOB, NodeRequest::new(fields("Partner", "Durand")))
        .await
        .unwrap();
    tree.relate(ALICE, me.id, partner.id, RelationKind::Spouse).await.unwrap();

    let graph = tree.family_graph(me.id).await.unwrap();
    assert_eq!(graph.root, me.id);
    let ids: Vec<NodeId> = graph.members.iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![me.id, mum.id, partner.id]);
    // Sorted by (from, to, kind): me was created first.
    assert_eq!(graph.relations, vec![
        DerivedRelation::spouse(me.id, partner.id),
        DerivedRelation::child(mum.id, me.id),
    ]);
    assert_eq!(graph.member(mum.id).map(|n| n.profile.first_name.as_str()), Some("Mum"));
}

#[tokio::test]
async fn test_family_graph_of_isolated_node() {
    let tree = setup().await;
    let me = tree.create_node(ALICE, NodeRequest::new(fields("Me", "Martin"))).await.unwrap();

    let graph = tree.family_graph(me.id).await.unwrap();
    assert_eq!(graph.members, vec![me]);
    assert!(graph.relations.is_empty());
}

// ============================================================================
// 6. Node introspection
// ============================================================================

#[tokio::test]
async fn test_is_anchor() {
    let tree = setup().await;
    let me = tree.create_node(ALICE, NodeRequest::new(fields("Alice", "Martin")).anchor()).await.unwrap();
    let mum = tree.create_node(ALICE, NodeRequest::new(fields("Mum", "Martin"))).await.unwrap();

    assert!(tree.is_anchor(me.id).await.unwrap());
    assert!(!tree.is_anchor(mum.id).await.unwrap());
    assert!(matches!(tree.is_anchor(NodeId(404)).await, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_filled_fields_count() {
    let tree = setup().await;
    let bare = tree.create_node(ALICE, NodeRequest::new(fields("Alice", "Martin"))).await.unwrap();
    let blank_optionals = tree
        .create_node(ALICE, NodeRequest::new(fields("Blank", "Martin").title(" ").address("").phone("\t")))
        .await
        .unwrap();
    let full = tree
        .create_node(
            ALICE,
            NodeRequest::new(
                fields("Full", "Martin")
                    .title("Mme")
                    .address("1 rue de la Paix")
                    .phone("+33 1 23 45 67 89")
                    .interests(["chess"]),
            ),
        )
        .await
        .unwrap();

    assert_eq!(tree.filled_fields(bare.id).await.unwrap(), 4);
    assert_eq!(tree.filled_fields(blank_optionals.id).await.unwrap(), 4);
    assert_eq!(tree.filled_fields(full.id).await.unwrap(), 8);
    assert!(matches!(tree.filled_fields(NodeId(404)).await, Err(Error::NotFound(_))));
}

// ============================================================================
// 7. Transactions are closed on every path
// ============================================================================

#[tokio::test]
async fn test_rejected_writes_roll_back_their_transaction() {
    let tree = setup().await;
    let a = tree.create_node(ALICE, NodeRequest::new(fields("A", "Martin")).anchor()).await.unwrap();
    let b = tree.create_node(ALICE, NodeRequest::new(fields("B", "Martin"))).await.unwrap();

    let result = tree.update_node(BOB, a.id, fields("Mallory", "Martin")).await;
    assert!(matches!(result, Err(Error::Unauthorized(_))));
    assert_eq!(tree.backend().open_transactions(), 0);

    let result = tree.relate(BOB, a.id, b.id, RelationKind::Spouse).await;
    assert!(matches!(result, Err(Error::Unauthorized(_))));
    assert_eq!(tree.backend().open_transactions(), 0);

    let result = tree.relate(ALICE, a.id, NodeId(77), RelationKind::Child).await;
    assert!(matches!(result, Err(Error::NotFound(_))));
    assert_eq!(tree.backend().open_transactions(), 0);

    let result = tree.create_node(ALICE, NodeRequest::new(fields("Again", "Martin")).anchor()).await;
    assert!(matches!(result, Err(Error::InvalidInput(_))));
    assert_eq!(tree.backend().open_transactions(), 0);
}

#[tokio::test]
async fn test_failed_reads_close_their_transaction() {
    let tree = setup().await;

    assert!(tree.node(NodeId(1)).await.is_err());
    assert!(tree.family_relations(NodeId(1)).await.is_err());
    assert!(tree.family_graph(NodeId(1)).await.is_err());
    assert!(tree.anchor_node(ALICE).await.is_err());
    assert_eq!(tree.backend().open_transactions(), 0);
}
