pub enum WatcherEvent {
    /// The marker hotkey was pressed; bookmark the current moment if a
    /// recording is in progress.
    MarkerRequested,
    /// Ctrl+C received; publish STOPPED and exit the loop.
    Shutdown,
}
