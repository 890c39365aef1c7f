//! Small control-flow automata shared by tests.

use std::sync::Arc;

use tessera_cfa::{Cfa, EdgeLabel, Location, NodeKind};

/// `entry -> error`.
pub struct TwoNode {
    pub cfa: Arc<Cfa>,
    pub entry: Location,
    pub error: Location,
}

pub fn two_node_error() -> TwoNode {
    let mut builder = Cfa::builder();
    let entry = builder.add_node(NodeKind::Entry);
    let error = builder.node().kind(NodeKind::Error).label("error").add();
    builder
        .add_edge(entry, error, EdgeLabel::statement("reach_error()"))
        .unwrap();
    TwoNode {
        cfa: Arc::new(builder.build().unwrap()),
        entry,
        error,
    }
}

/// A single entry location with an edge back to itself.
pub fn self_loop() -> (Arc<Cfa>, Location) {
    let mut builder = Cfa::builder();
    let entry = builder.add_node(NodeKind::Entry);
    builder
        .add_edge(entry, entry, EdgeLabel::statement("x += 1"))
        .unwrap();
    (Arc::new(builder.build().unwrap()), entry)
}

/// `entry` branches on `c` to `then` and `orelse`, which meet again at
/// `join` and fall through to `exit`.
pub struct Diamond {
    pub cfa: Arc<Cfa>,
    pub entry: Location,
    pub then: Location,
    pub orelse: Location,
    pub join: Location,
    pub exit: Location,
}

pub fn diamond() -> Diamond {
    let mut builder = Cfa::builder();
    let entry = builder.add_node(NodeKind::Entry);
    let then = builder.add_node(NodeKind::Regular);
    let orelse = builder.add_node(NodeKind::Regular);
    let join = builder.add_node(NodeKind::Regular);
    let exit = builder.add_node(NodeKind::Exit);
    builder
        .add_edge(entry, then, EdgeLabel::assume("c", true))
        .unwrap();
    builder
        .add_edge(entry, orelse, EdgeLabel::assume("c", false))
        .unwrap();
    builder
        .add_edge(then, join, EdgeLabel::statement("x = 0"))
        .unwrap();
    builder
        .add_edge(orelse, join, EdgeLabel::statement("x += 1"))
        .unwrap();
    builder.add_edge(join, exit, EdgeLabel::Blank).unwrap();
    Diamond {
        cfa: Arc::new(builder.build().unwrap()),
        entry,
        then,
        orelse,
        join,
        exit,
    }
}

/// ```text
/// entry -x = 0-> head
/// head  -[x < n]-> body -x += 1-> head
/// head  -[!(x < n)]-> exit
/// body  -havoc-> error   (only when `with_error`)
/// ```
pub struct Loop {
    pub cfa: Arc<Cfa>,
    pub entry: Location,
    pub head: Location,
    pub body: Location,
    pub exit: Location,
    pub error: Option<Location>,
}

pub fn counting_loop(with_error: bool) -> Loop {
    let mut builder = Cfa::builder();
    let entry = builder.add_node(NodeKind::Entry);
    let head = builder.node().kind(NodeKind::Regular).label("head").add();
    let body = builder.add_node(NodeKind::Regular);
    let exit = builder.add_node(NodeKind::Exit);
    builder
        .add_edge(entry, head, EdgeLabel::statement("x = 0"))
        .unwrap();
    builder
        .add_edge(head, body, EdgeLabel::assume("x < n", true))
        .unwrap();
    builder
        .add_edge(body, head, EdgeLabel::statement("x += 1"))
        .unwrap();
    builder
        .add_edge(head, exit, EdgeLabel::assume("x < n", false))
        .unwrap();
    let error = with_error.then(|| {
        let error = builder.add_node(NodeKind::Error);
        builder
            .add_edge(body, error, EdgeLabel::statement("havoc"))
            .unwrap();
        error
    });
    Loop {
        cfa: Arc::new(builder.build().unwrap()),
        entry,
        head,
        body,
        exit,
        error,
    }
}

/// A straight line of `len` edges from the entry to an exit.
pub fn straight_line(len: usize) -> (Arc<Cfa>, Vec<Location>) {
    let mut builder = Cfa::builder();
    let mut locations = vec![builder.add_node(NodeKind::Entry)];
    for i in 0..len {
        let kind = if i + 1 == len {
            NodeKind::Exit
        } else {
            NodeKind::Regular
        };
        let next = builder.add_node(kind);
        builder
            .add_edge(locations[i], next, EdgeLabel::statement("x += 1"))
            .unwrap();
        locations.push(next);
    }
    (Arc::new(builder.build().unwrap()), locations)
}
