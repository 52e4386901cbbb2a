//! Round-robin interleaving of friends' shelf activity.
//!
//! A global sort-and-truncate by timestamp would let one highly active
//! friend fill the whole feed. Visiting friends round-robin guarantees
//! breadth across friends before depth from any one friend, while the
//! initial sort still favors whoever was active most recently.

use crate::models::{Profile, ShelfItem};

/// One followed profile with their own reverse-chronological shelf items.
#[derive(Debug, Clone)]
pub struct FriendActivity {
    pub profile: Profile,
    pub items: Vec<ShelfItem>,
}

impl FriendActivity {
    fn latest(&self) -> Option<i64> {
        self.items.first().map(|item| item.created_at)
    }
}

/// Interleave friends' items round-robin until `limit` items are collected
/// or every friend's list is exhausted, whichever comes first.
pub fn interleave_friends_activity(
    mut friends: Vec<FriendActivity>,
    limit: usize,
) -> Vec<ShelfItem> {
    friends.retain(|friend| !friend.items.is_empty());
    friends.sort_by(|a, b| b.latest().cmp(&a.latest()));

    let total: usize = friends.iter().map(|friend| friend.items.len()).sum();
    let target = limit.min(total);

    let mut result = Vec::with_capacity(target);
    let mut round = 0;
    // Both exit conditions are re-checked every round; an unreachable
    // `limit` terminates by exhaustion instead of spinning.
    while result.len() < target {
        let mut took_any = false;
        for friend in &friends {
            if let Some(item) = friend.items.get(round) {
                result.push(item.clone());
                took_any = true;
                if result.len() == target {
                    break;
                }
            }
        }
        if !took_any {
            break;
        }
        round += 1;
    }
    result
}
