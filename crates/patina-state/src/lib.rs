//! Session-lifetime interpreter state: registers, marks, the jump list,
//! visual-selection bookkeeping, and the undo-scope contract.

pub mod jumplist;
pub mod marks;
pub mod registers;
pub mod undo;
pub mod visual;

pub use jumplist::{JUMPLIST_MAX, JumpList};
pub use marks::{MarkFile, MarkLookup, MarkSlot};
pub use registers::{
    Clipboard, ClipboardTarget, RegisterContent, RegisterError, RegisterFile, RegisterId,
};
pub use undo::{ChangeScope, SnapshotUndo, UndoLog};
pub use visual::{ReselectGeometry, VisualState};
