use std::{cell::RefCell, rc::Rc};

use libpulse_binding::{
    callbacks::ListResult,
    context::{Context, FlagSet, State},
    mainloop::standard::{IterateResult, Mainloop},
    operation::{Operation, State as OperationState},
    volume::{ChannelVolumes, Volume},
};

use super::{VolumeControl, VolumeError, VolumeRange};

// number of mainloop iterations to wait for the connection to become ready
const MAX_CONNECT_ITERATIONS: usize = 100;

/// Default PulseAudio sink, driven through a private blocking mainloop.
pub struct PulseVolume {
    mainloop: Mainloop,
    context: Context,
    sink_name: String,
    channels: u8,
}

impl PulseVolume {
    pub fn connect_default() -> Result<Self, VolumeError> {
        let mut mainloop = Mainloop::new().ok_or_else(|| {
            VolumeError::Connection("failed to create PulseAudio mainloop".to_string())
        })?;
        let mut context = Context::new(&mainloop, "hand-volume").ok_or_else(|| {
            VolumeError::Connection("failed to create PulseAudio context".to_string())
        })?;

        context
            .connect(None, FlagSet::NOFLAGS, None)
            .map_err(|e| VolumeError::Connection(format!("failed to connect: {e}")))?;

        let mut iterations = 0;
        loop {
            iterate(&mut mainloop)?;
            iterations += 1;
            match context.get_state() {
                State::Ready => break,
                State::Failed | State::Terminated => {
                    return Err(VolumeError::Connection(
                        "PulseAudio connection failed or terminated".to_string(),
                    ));
                }
                _ if iterations >= MAX_CONNECT_ITERATIONS => {
                    return Err(VolumeError::Connection(
                        "PulseAudio server unavailable or connection timed out".to_string(),
                    ));
                }
                _ => {}
            }
        }

        let sink_name = default_sink_name(&mut mainloop, &context)?;
        let channels = sink_channels(&mut mainloop, &context, &sink_name)?;
        log::info!("controlling PulseAudio sink {sink_name} ({channels} channels)");

        Ok(Self {
            mainloop,
            context,
            sink_name,
            channels,
        })
    }
}

impl VolumeControl for PulseVolume {
    /// Raw PulseAudio volume units, from muted to 100%.
    fn range(&self) -> VolumeRange {
        VolumeRange {
            min: Volume::MUTED.0 as f32,
            max: Volume::NORMAL.0 as f32,
        }
    }

    fn set_level(&mut self, level: f32) -> Result<(), VolumeError> {
        let raw = self.range().clamp(level).round() as u32;
        let mut volumes = ChannelVolumes::default();
        volumes.set(self.channels, Volume(raw));

        let done = Rc::new(RefCell::new(None));
        let done_cb = Rc::clone(&done);
        let op = self.context.introspect().set_sink_volume_by_name(
            &self.sink_name,
            &volumes,
            Some(Box::new(move |success| {
                *done_cb.borrow_mut() = Some(success);
            })),
        );
        wait_for(&mut self.mainloop, &op)?;

        let success = *done.borrow();
        match success {
            Some(true) => Ok(()),
            _ => Err(VolumeError::Operation(format!(
                "setting volume of {} failed",
                self.sink_name
            ))),
        }
    }
}

impl Drop for PulseVolume {
    fn drop(&mut self) {
        self.context.disconnect();
    }
}

fn iterate(mainloop: &mut Mainloop) -> Result<(), VolumeError> {
    match mainloop.iterate(true) {
        IterateResult::Quit(_) | IterateResult::Err(_) => Err(VolumeError::Connection(
            "PulseAudio mainloop error".to_string(),
        )),
        IterateResult::Success(_) => Ok(()),
    }
}

fn wait_for<F: ?Sized>(mainloop: &mut Mainloop, op: &Operation<F>) -> Result<(), VolumeError> {
    loop {
        match op.get_state() {
            OperationState::Done => return Ok(()),
            OperationState::Cancelled => {
                return Err(VolumeError::Operation("operation cancelled".to_string()));
            }
            OperationState::Running => iterate(mainloop)?,
        }
    }
}

fn default_sink_name(mainloop: &mut Mainloop, context: &Context) -> Result<String, VolumeError> {
    let name = Rc::new(RefCell::new(None));
    let name_cb = Rc::clone(&name);
    let op = context.introspect().get_server_info(move |info| {
        *name_cb.borrow_mut() = info.default_sink_name.as_ref().map(|n| n.to_string());
    });
    wait_for(mainloop, &op)?;

    let found = name.borrow_mut().take();
    found.ok_or(VolumeError::NoOutputDevice)
}

fn sink_channels(
    mainloop: &mut Mainloop,
    context: &Context,
    sink_name: &str,
) -> Result<u8, VolumeError> {
    let channels = Rc::new(RefCell::new(None));
    let channels_cb = Rc::clone(&channels);
    let op = context
        .introspect()
        .get_sink_info_by_name(sink_name, move |result| {
            if let ListResult::Item(info) = result {
                *channels_cb.borrow_mut() = Some(info.volume.len());
            }
        });
    wait_for(mainloop, &op)?;

    let found = channels.borrow_mut().take();
    found.ok_or(VolumeError::NoOutputDevice)
}
