pub mod grouped_fifo;
