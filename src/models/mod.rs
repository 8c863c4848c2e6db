mod comment;
mod item;
mod story;

pub use comment::{Comment, FetchedComment, NewComment};
pub use item::Item;
pub use story::{NewStory, RankedStory, SortMode, Stats, Story};
