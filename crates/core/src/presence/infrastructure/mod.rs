pub mod line_signal_writer;
