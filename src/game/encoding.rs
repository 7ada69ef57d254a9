/// Encode a board as player-relative one-hot channels.
///
/// `cells` is the board in row-major order, each cell holding the owning
/// seat or `None` when empty. The result has `player_count` channels of
/// `cells.len()` values each:
///
/// Channel 0: pieces of `seat` (the player to move)
/// Channel 1: pieces of the next seat in turn order
/// ...and so on around the table.
///
/// A 3x3 board with two players therefore encodes to 18 features. With no
/// players there are no channels and the result is empty.
pub fn encode_board(cells: &[Option<usize>], seat: usize, player_count: usize) -> Vec<f32> {
    if player_count == 0 {
        return Vec::new();
    }
    let size = cells.len();
    let mut data = vec![0.0f32; player_count * size];
    for (idx, cell) in cells.iter().enumerate() {
        if let Some(owner) = *cell {
            let channel = (owner + player_count - seat % player_count) % player_count;
            data[channel * size + idx] = 1.0;
        }
    }
    data
}

/// Legal-action mask for placement games: every empty cell is playable.
pub fn empty_cells_mask(cells: &[Option<usize>]) -> Vec<bool> {
    cells.iter().map(|c| c.is_none()).collect()
}
