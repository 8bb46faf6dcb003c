pub mod collector;
pub mod device;
pub mod file;
pub mod level;

pub use collector::{FragmentCollector, Recording, RECORDING_CONTENT_TYPE};
pub use device::{
    AudioFragment, CaptureConfig, CaptureDevice, CaptureDeviceFactory, CaptureError, CaptureEvent,
    CaptureSource, MicrophoneDevice, SpectrumFrame,
};
pub use file::WavFileDevice;
pub use level::{BarState, LevelMeter, LevelSample, LEVEL_BARS};
