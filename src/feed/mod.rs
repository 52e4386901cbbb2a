// Feed - decoration and friends-activity assembly over fetched records

pub mod comments;
pub mod decorate;
pub mod interleave;

pub use comments::{build_comment_tree, CommentNode};
pub use decorate::{
    decorate_feed_page, decorate_with_comments, decorate_with_followers,
    decorate_with_following, decorate_with_likes, decorate_with_saves, FollowOptions,
};
pub use interleave::{interleave_friends_activity, FriendActivity};
