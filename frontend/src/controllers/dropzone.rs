//! Drop target input normalisation.
//!
//! Picker changes, click/keyboard activation and drag-and-drop all end up
//! as one of two effects: open the native picker, or hand a file list to
//! the selection store.

/// Input reaching the drop zone or its hidden file input.
#[derive(Clone, Debug, PartialEq)]
pub enum DropZoneInput<F> {
    /// The native file input reported a new selection.
    PickerChanged(Vec<F>),
    /// The drop target was clicked.
    Click,
    /// A key was pressed while the drop target had focus.
    Key(String),
    DragEnter,
    DragOver,
    DragLeave,
    DragEnd,
    /// Files were dropped on the target.
    Drop(Vec<F>),
}

/// What the caller should do after [`DropZone::handle`].
#[derive(Clone, Debug, PartialEq)]
pub enum DropZoneEffect<F> {
    None,
    /// Open the native picker; keyboard activation also suppresses the
    /// key's default action.
    OpenPicker,
    /// Replace the staged selection.
    FilesChosen(Vec<F>),
}

/// Visual drag state of the drop target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DropZone {
    drag_active: bool,
}

/// Keys that activate the drop target.
pub fn is_activation_key(key: &str) -> bool {
    key == "Enter" || key == " "
}

impl DropZone {
    pub fn drag_active(&self) -> bool {
        self.drag_active
    }

    pub fn handle<F>(&mut self, input: DropZoneInput<F>) -> DropZoneEffect<F> {
        match input {
            DropZoneInput::PickerChanged(files) => DropZoneEffect::FilesChosen(files),
            DropZoneInput::Click => DropZoneEffect::OpenPicker,
            DropZoneInput::Key(key) if is_activation_key(&key) => DropZoneEffect::OpenPicker,
            DropZoneInput::Key(_) => DropZoneEffect::None,
            DropZoneInput::DragEnter | DropZoneInput::DragOver => {
                self.drag_active = true;
                DropZoneEffect::None
            }
            DropZoneInput::DragLeave | DropZoneInput::DragEnd => {
                self.drag_active = false;
                DropZoneEffect::None
            }
            DropZoneInput::Drop(files) => {
                self.drag_active = false;
                if files.is_empty() {
                    DropZoneEffect::None
                } else {
                    DropZoneEffect::FilesChosen(files)
                }
            }
        }
    }
}
