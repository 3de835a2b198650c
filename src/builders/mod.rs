// Module declarations for `builders`. These modules hold the building
// blocks the engine composes: reading records, indexing targets, comparing,
// rendering and aggregating.

// `extractor` module:
// Streams files into numbered lines, non-empty `LineRecord`s and 12-digit
// `TokenRecord`s. Undecodable bytes are replaced instead of failing a file.
pub mod extractor;

// `target_index` module:
// Builds the read-only `TargetIndex` membership sets, either as one folder
// union or as one index per target file (`TargetSet`).
pub mod target_index;

// `comparator` module:
// The two algorithms: unordered membership and ordered sequence alignment,
// plus the `ComparisonResult` handed from a task to the aggregator.
pub mod comparator;

// `reporter` module:
// Renders the per-source reports in their fixed textual layout and writes
// them under names derived from the source file.
pub mod reporter;

// `aggregator` module:
// Turns all results of a pass into a `PassSummary` and concatenates the two
// directions into the master summary.
pub mod aggregator;

// `validator` module:
// `ConfigValidator` and its `StandardValidator` implementation used by the
// `validate` command.
pub mod validator;
