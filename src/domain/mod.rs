// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust structs and traits describing what the system
// works with: stories, the facts inside them, and the
// questions asked about those facts.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)
//            Weston et al. (2015) bAbI tasks

// A parsed story: ordered facts interleaved with questions
pub mod story;

// One question together with the facts that precede it
pub mod qa_pair;

// Core abstractions (traits) that other layers implement
pub mod traits;
