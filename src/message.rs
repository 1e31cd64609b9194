use std::path::PathBuf;
use std::time::Instant;

use studyboard::core::background::BackgroundMode;
use studyboard::core::quote::Quote;
use studyboard::core::transition::LoadRequest;
use studyboard::core::upload::UploadError;
use studyboard::remote::loader::DecodedImage;

#[derive(Debug, Clone)]
pub enum Message {
    // Clock
    Tick(Instant),
    FadeFrame(Instant),
    CloseRequested,

    // Background selection
    ToggleBackgroundPanel,
    SelectBackground(BackgroundMode),
    RefreshDailyImage,
    PickCustomImage,
    CustomImagePicked(Option<PathBuf>),
    CustomImageRead(Result<String, UploadError>),
    DismissUploadError,

    // Background transition
    ImagePreloaded(LoadRequest, Result<DecodedImage, String>),
    SwapDue(LoadRequest),
    RetryDue(LoadRequest),
    DismissNotice(u64),

    // Subjects
    EditSubject(usize),
    SubjectInputChanged(String),
    SaveSubject(usize),
    CancelEdit,

    // Quote
    QuoteFetched(Option<Quote>),
    ToggleQuoteSettings,
    QuoteIntervalInput(String),

    // Settings
    ToggleDebugLogging,
}
