//! Presence detection over a camera feed.
//!
//! Frames flow from a [`capture::domain::camera_source::CameraSource`]
//! through a [`detection::domain::face_classifier::FaceClassifier`] into the
//! debounce state machine in [`presence::domain::presence_state`], and state
//! changes leave as protocol lines through a
//! [`presence::domain::signal_sink::SignalSink`].

pub mod capture {
    pub mod domain {
        pub mod camera_source;
    }
    pub mod infrastructure;
}

pub mod detection {
    pub mod domain {
        pub mod face_classifier;
        pub mod face_detector;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod monitor_logger;
    pub mod presence_monitor;
}

pub mod presence {
    pub mod domain {
        pub mod presence_state;
        pub mod signal;
        pub mod signal_sink;
    }
    pub mod infrastructure;
}

pub mod shared {
    pub mod clock;
    pub mod constants;
    pub mod frame;
    pub mod region;
}
