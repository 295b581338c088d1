// History reader capability
// The chain database view consumed by the provers

use crate::popow_header::PoPowHeader;
use aurum_core::{BlockId, Header};

/// Read access to the best header chain and its extension sections
///
/// Implementations present a consistent snapshot for the duration of a
/// single proof generation; the provers never write through this trait.
pub trait HistoryReader {
    /// Height of the best header, 0 while the history is empty
    fn headers_height(&self) -> u32;

    /// Best (highest) header of the chain, if any
    fn best_header(&self) -> Option<Header>;

    /// Id of the best-chain header at the given height
    fn best_header_id_at_height(&self, height: u32) -> Option<BlockId>;

    /// Header with unpacked interlinks, by id
    fn popow_header(&self, id: &BlockId) -> Option<PoPowHeader>;

    /// Header with unpacked interlinks, by best-chain height
    fn popow_header_at(&self, height: u32) -> Option<PoPowHeader>;

    /// Last `count` headers of the best chain, ascending by height
    fn last_headers(&self, count: u32) -> Vec<Header>;

    /// Up to `count` best-chain headers following `header`, ascending
    fn best_headers_after(&self, header: &Header, count: u32) -> Vec<Header>;

    /// Raw fields of the extension section with the given id
    fn extension_fields(&self, extension_id: &BlockId) -> Option<Vec<(Vec<u8>, Vec<u8>)>>;
}
