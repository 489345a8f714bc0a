pub mod config;
pub mod cpu_affinity;
pub mod error;
pub mod fifo_sequencer;
pub mod high_resolution_timer;
pub mod logging;
pub mod matching_engine;
pub mod md_consumer;
pub mod md_publisher;
pub mod message_codec;
pub mod messages;
pub mod net;
pub mod number_tool;
pub mod object_pool;
pub mod order;
pub mod order_book;
pub mod order_server;
pub mod perf_stats;
pub mod snapshot_synthesiser;
pub mod spsc_ring;
pub mod text_output_tool;
pub mod types;
