mod deque;
pub use deque::Deque;

mod double_float;
pub use double_float::DoubleFloat;

mod monotonic_queue;
pub use monotonic_queue::{Max, Min, MonotonicQueue};

mod rb_tree;
pub use rb_tree::RbTree;

mod ring_buffer;
pub use ring_buffer::RingBuffer;
